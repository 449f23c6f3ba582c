//! Persistence backend over a host-supplied JS API object.
//!
//! The host passes an object with one promise-returning function per
//! operation (`createDrawing`, `updateDrawing`, `deleteDrawing`,
//! `updateNode`, `deleteNode`, `saveGroups`). Each request is started as a
//! detached future; nothing awaits it. Completions land in a shared queue
//! that the canvas drains on its next pump.

use js_sys::{Array, Function, Object, Promise, Reflect};
use kg_core::id::EntityId;
use kg_editor::{Backend, PersistError, PersistOutcome, PersistRequest};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

pub struct JsBackend {
    api: Object,
    completed: Rc<RefCell<Vec<PersistOutcome>>>,
}

impl JsBackend {
    pub fn new(api: Object) -> Self {
        Self {
            api,
            completed: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Invoke the API function for `request`. Plain return values are
    /// wrapped so every call can be awaited.
    fn call(&self, request: &PersistRequest) -> Result<Promise, JsValue> {
        let func: Function = Reflect::get(&self.api, &JsValue::from_str(request.op()))?.dyn_into()?;
        let args = request_args(request)?;
        let value = func.apply(&self.api, &args)?;
        Ok(Promise::resolve(&value))
    }
}

impl Backend for JsBackend {
    fn dispatch(&mut self, request: PersistRequest) {
        let op = request.op();
        let local_id = match &request {
            PersistRequest::CreateDrawing { local_id, .. } => Some(*local_id),
            _ => None,
        };
        let call = self.call(&request);
        let completed = Rc::clone(&self.completed);

        wasm_bindgen_futures::spawn_local(async move {
            let result = match call {
                Ok(promise) => JsFuture::from(promise).await,
                Err(e) => Err(e),
            };
            let outcome = match (local_id, result) {
                (Some(local_id), Ok(value)) => match created_id(&value) {
                    Some(server_id) => PersistOutcome::Created {
                        local_id,
                        server_id,
                    },
                    None => PersistOutcome::CreateFailed {
                        local_id,
                        error: PersistError::MissingId,
                    },
                },
                (Some(local_id), Err(e)) => PersistOutcome::CreateFailed {
                    local_id,
                    error: PersistError::rejected(op, describe(&e)),
                },
                (None, Ok(_)) => return,
                (None, Err(e)) => PersistOutcome::Failed {
                    error: PersistError::rejected(op, describe(&e)),
                },
            };
            completed.borrow_mut().push(outcome);
        });
    }

    fn poll(&mut self) -> Vec<PersistOutcome> {
        std::mem::take(&mut *self.completed.borrow_mut())
    }
}

fn request_args(request: &PersistRequest) -> Result<Array, JsValue> {
    let args = match request {
        PersistRequest::CreateDrawing {
            project_id,
            group_id,
            drawing,
            ..
        } => vec![
            JsValue::from_str(project_id),
            JsValue::from_f64(f64::from(*group_id)),
            to_js(drawing)?,
        ],
        PersistRequest::UpdateDrawing { id, patch } => vec![id_value(*id), to_js(patch)?],
        PersistRequest::DeleteDrawing { id } | PersistRequest::DeleteNode { id } => {
            vec![id_value(*id)]
        }
        PersistRequest::UpdateNode { id, patch } => vec![id_value(*id), to_js(patch)?],
        PersistRequest::SaveGroups { project_id, groups } => {
            vec![JsValue::from_str(project_id), to_js(groups)?]
        }
    };
    Ok(args.into_iter().collect())
}

fn id_value(id: EntityId) -> JsValue {
    JsValue::from_str(id.as_str())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

/// `id` of a create response; numeric ids are accepted and stringified.
fn created_id(value: &JsValue) -> Option<EntityId> {
    let id = Reflect::get(value, &JsValue::from_str("id")).ok()?;
    if let Some(s) = id.as_string() {
        return (!s.is_empty()).then(|| EntityId::intern(&s));
    }
    id.as_f64().map(|n| EntityId::intern(&n.to_string()))
}

fn describe(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}
