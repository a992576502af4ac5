//! show / cancel / cancelAll / clearSuppressionLedger
//!
//! 这些方法只返回布尔值；参数不完整按失败处理，不返回协议错误。

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::parse_params;
use crate::notification::DispatchRequest;
use crate::relay::Relay;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelParams {
    #[serde(default, alias = "notificationId")]
    logical_id: String,
}

pub fn handle_show(relay: &Relay, params: Option<Value>) -> Result<Value> {
    let request: DispatchRequest = match parse_params(params) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Rejecting malformed show request");
            return Ok(json!(false));
        }
    };
    Ok(json!(relay.dispatch().show(&request).is_success()))
}

pub fn handle_cancel(relay: &Relay, params: Option<Value>) -> Result<Value> {
    let params: CancelParams = parse_params(params).unwrap_or_default();
    if params.logical_id.is_empty() {
        warn!("Rejecting cancel request without logical id");
        return Ok(json!(false));
    }
    Ok(json!(relay.dispatch().cancel(&params.logical_id)))
}

pub fn handle_cancel_all(relay: &Relay) -> Result<Value> {
    Ok(json!(relay.dispatch().cancel_all()))
}

pub fn handle_clear_suppression_ledger(relay: &Relay) -> Result<Value> {
    relay.dispatch().clear_suppression_ledger();
    Ok(json!(true))
}
