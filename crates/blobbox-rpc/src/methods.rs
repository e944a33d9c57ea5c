use blobbox_core::{Envelope, Operation, OperationResult, validate_name};
use blobbox_storage::{BlobStore, SaveOutcome};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Result, RpcError};
use crate::protocol::{Params, RpcRequest};
use crate::server::RpcServer;

pub const INVALID_PARAMS: &str = "invalid params";
pub const SAVE_CAPACITY_EXCEEDED: &str = "save failed (capacity exceeded)";
pub const SAVE_UNSERIALIZABLE: &str = "save failed (value not serializable)";
pub const NOT_FOUND: &str = "no data for name";

/// Resolve the requested operation, run it and wrap its result
pub async fn handle_request(server: &RpcServer, req: RpcRequest) -> Result<Envelope> {
    let op = Operation::resolve(&req.method)
        .ok_or_else(|| RpcError::UnknownOperation(req.method.clone()))?;

    debug!(operation = %op, "dispatching");
    let result = call_operation(&server.store, op, &req.params).await?;

    Ok(Envelope::new(result))
}

pub async fn call_operation(
    store: &BlobStore,
    op: Operation,
    params: &Params,
) -> Result<OperationResult> {
    match op {
        Operation::DataSet => data_set(store, params).await,
        Operation::DataGet => data_get(store, params).await,
        Operation::Reset => {
            store.reset().await?;
            Ok(OperationResult::success())
        }
        Operation::ListNames => {
            let names = store.names().await?;
            Ok(OperationResult::success_with(json!(names)))
        }
    }
}

async fn data_set(store: &BlobStore, params: &Params) -> Result<OperationResult> {
    let (Some(name), Some(data)) = (required_name(params), required_data(params)) else {
        return Ok(OperationResult::failed(INVALID_PARAMS));
    };

    let result = match store.save(name, data).await? {
        SaveOutcome::Saved => OperationResult::success(),
        SaveOutcome::QuotaExceeded { .. } => OperationResult::failed(SAVE_CAPACITY_EXCEEDED),
        SaveOutcome::Unserializable => OperationResult::failed(SAVE_UNSERIALIZABLE),
    };
    Ok(result)
}

async fn data_get(store: &BlobStore, params: &Params) -> Result<OperationResult> {
    let Some(name) = required_name(params) else {
        return Ok(OperationResult::failed(INVALID_PARAMS));
    };

    let result = match store.load(name).await? {
        Some(value) => OperationResult::success_with(value),
        None => OperationResult::failed(NOT_FOUND),
    };
    Ok(result)
}

fn required_name(params: &Params) -> Option<&str> {
    params
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| validate_name(name).is_ok())
}

/// `data` must be present and not null
fn required_data(params: &Params) -> Option<&Value> {
    params.get("data").filter(|data| !data.is_null())
}
