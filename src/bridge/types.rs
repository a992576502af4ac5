//! 事件通道的 JSON-RPC 2.0 类型

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notification::Invocation;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// 编排端 → native 的请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

impl ChannelRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_version(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// 没有 id 的请求不需要响应
    pub fn expects_response(&self) -> bool {
        self.id.is_some()
    }
}

/// 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ChannelErrorObject>,
}

/// 响应里的错误对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelErrorObject {
    pub code: i32,
    pub message: String,
}

impl ChannelResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: None,
            error: Some(ChannelErrorObject { code, message }),
        }
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(id: Option<Value>, message: String) -> Self {
        Self::error(id, INVALID_PARAMS, message)
    }
}

/// native → 编排端的 fire-and-forget 调用（JSON-RPC notification，没有 id）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl From<&Invocation> for ChannelNotification {
    fn from(invocation: &Invocation) -> Self {
        Self {
            jsonrpc: default_version(),
            method: invocation.method().to_string(),
            params: invocation.params(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{CapturedEvent, RawNotification};
    use serde_json::json;

    #[test]
    fn test_request_without_id_or_params() {
        let request: ChannelRequest = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"stopCapture"}"#).unwrap();
        assert_eq!(request.method, "stopCapture");
        assert!(request.params.is_none());
        assert!(!request.expects_response());
    }

    #[test]
    fn test_error_response_omits_result() {
        let response = ChannelResponse::method_not_found(Some(json!(3)), "bogus");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_notification_from_invocation() {
        let raw = RawNotification::new("com.thirdparty.chat", 1000).with_title("Hi").with_text("there");
        let event = CapturedEvent::from_raw(&raw, "Chat");

        let value = serde_json::to_value(ChannelNotification::from(&Invocation::NotificationCaptured(event))).unwrap();
        assert_eq!(value["method"], "onNotificationCaptured");
        assert_eq!(value["params"]["logicalId"], "1000");
        assert!(value.get("id").is_none());

        let value = serde_json::to_value(ChannelNotification::from(&Invocation::CaptureConnected)).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "method": "captureConnected"}));
    }
}
