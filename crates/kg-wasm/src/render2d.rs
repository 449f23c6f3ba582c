//! Canvas2D replay of the paint list.
//!
//! The layout library hands us a context already transformed into world
//! space (`onRenderFramePost(ctx, scale)`), so commands are drawn in world
//! coordinates as-is.

use kg_render::DrawCmd;
use kg_render::paint::{dash_pattern, text_line_offset};
use kurbo::{BezPath, PathEl};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

/// Draw every command in order.
pub fn render_commands(ctx: &CanvasRenderingContext2d, cmds: &[DrawCmd]) {
    for cmd in cmds {
        ctx.save();
        match cmd {
            DrawCmd::Stroke {
                path,
                color,
                width,
                dash,
            } => {
                let segments: js_sys::Array = dash_pattern(*dash, *width)
                    .into_iter()
                    .map(JsValue::from_f64)
                    .collect();
                let _ = ctx.set_line_dash(&segments);
                ctx.set_stroke_style_str(color);
                ctx.set_line_width(*width);
                ctx.set_line_cap("round");
                ctx.set_line_join("round");
                trace_path(ctx, path);
                ctx.stroke();
            }
            DrawCmd::Fill { path, color } => {
                ctx.set_fill_style_str(color);
                trace_path(ctx, path);
                ctx.fill();
            }
            DrawCmd::Text {
                anchor,
                angle,
                lines,
                font_size,
                font_family,
                color,
            } => {
                let _ = ctx.translate(anchor.x, anchor.y);
                let _ = ctx.rotate(*angle);
                ctx.set_font(&format!("{font_size}px {font_family}"));
                ctx.set_fill_style_str(color);
                ctx.set_text_baseline("top");
                for (i, line) in lines.iter().enumerate() {
                    let _ = ctx.fill_text(line, 0.0, text_line_offset(i, *font_size));
                }
            }
        }
        ctx.restore();
    }
}

fn trace_path(ctx: &CanvasRenderingContext2d, path: &BezPath) {
    ctx.begin_path();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
            PathEl::QuadTo(c, p) => ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}
