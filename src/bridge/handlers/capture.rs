//! startCapture / stopCapture / queryCaptureActive / queryPermissionGranted / openPermissionSettings

use anyhow::Result;
use serde_json::{json, Value};

use crate::relay::Relay;

pub fn handle_start_capture(relay: &Relay) -> Result<Value> {
    Ok(json!(relay.capture().start()))
}

pub fn handle_stop_capture(relay: &Relay) -> Result<Value> {
    Ok(json!(relay.capture().stop()))
}

pub fn handle_query_capture_active(relay: &Relay) -> Result<Value> {
    Ok(json!(relay.capture().is_active()))
}

pub fn handle_query_permission_granted(relay: &Relay) -> Result<Value> {
    Ok(json!(relay.capture().permission_granted()))
}

/// 没有返回值
pub fn handle_open_permission_settings(relay: &Relay) -> Result<Value> {
    relay.capture().open_permission_settings();
    Ok(Value::Null)
}
