//! 通道服务端 - 按行读写 JSON-RPC
//!
//! 一个任务同时处理两个方向：读请求并写响应，把 native 侧的调用写成通知。
//! stdout 只写协议行，日志走 stderr。

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::handlers::{apps, capture, dispatch, platform};
use super::types::{ChannelNotification, ChannelRequest, ChannelResponse};
use crate::notification::Invocation;
use crate::platform::PlatformEvent;
use crate::relay::Relay;

/// 通道服务端
pub struct BridgeServer {
    relay: Arc<Relay>,
    platform_events: UnboundedSender<PlatformEvent>,
}

impl BridgeServer {
    pub fn new(relay: Arc<Relay>, platform_events: UnboundedSender<PlatformEvent>) -> Self {
        Self {
            relay,
            platform_events,
        }
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// 运行在 stdio 上，stdin 关闭时返回
    pub async fn run(&self, invocations: UnboundedReceiver<Invocation>) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        info!("Notification relay bridge started (stdio)");
        self.run_with(reader, writer, invocations).await
    }

    /// 在任意读写端上运行
    pub async fn run_with<R, W>(
        &self,
        reader: R,
        mut writer: W,
        mut invocations: UnboundedReceiver<Invocation>,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut invocations_open = true;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    if let Some(response) = self.handle_line(&line) {
                        write_line(&mut writer, &response).await?;
                    }
                }
                invocation = invocations.recv(), if invocations_open => {
                    match invocation {
                        Some(invocation) => {
                            write_line(&mut writer, &ChannelNotification::from(&invocation)).await?;
                        }
                        None => invocations_open = false,
                    }
                }
            }
        }

        // 输入结束前已产生的调用尽量送出
        while let Ok(invocation) = invocations.try_recv() {
            write_line(&mut writer, &ChannelNotification::from(&invocation)).await?;
        }

        info!("Bridge input closed");
        Ok(())
    }

    /// 处理一行输入；无法解析或不需要响应时返回 None
    pub fn handle_line(&self, line: &str) -> Option<ChannelResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let request: ChannelRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Failed to parse channel request");
                return None;
            }
        };

        let expects_response = request.expects_response();
        let response = self.handle_request(request);
        expects_response.then_some(response)
    }

    /// 处理一个请求
    pub fn handle_request(&self, request: ChannelRequest) -> ChannelResponse {
        debug!(method = %request.method, "Channel request");
        let relay = self.relay.as_ref();
        let events = &self.platform_events;
        let params = request.params;

        let result = match request.method.as_str() {
            "startCapture" => capture::handle_start_capture(relay),
            "stopCapture" => capture::handle_stop_capture(relay),
            "queryCaptureActive" => capture::handle_query_capture_active(relay),
            "queryPermissionGranted" => capture::handle_query_permission_granted(relay),
            "openPermissionSettings" => capture::handle_open_permission_settings(relay),
            "show" => dispatch::handle_show(relay, params),
            "cancel" => dispatch::handle_cancel(relay, params),
            "cancelAll" => dispatch::handle_cancel_all(relay),
            "clearSuppressionLedger" => dispatch::handle_clear_suppression_ledger(relay),
            "listInstalledApps" => apps::handle_list_installed_apps(relay),
            "platform/posted" => platform::handle_posted(events, params),
            "platform/removed" => platform::handle_removed(events, params),
            "platform/listenerConnected" => platform::handle_listener_connected(events),
            "platform/listenerDisconnected" => platform::handle_listener_disconnected(events),
            "platform/dismissed" => platform::handle_dismissed(events, params),
            "platform/tapped" => platform::handle_tapped(events, params),
            method => return ChannelResponse::method_not_found(request.id, method),
        };

        match result {
            Ok(value) => ChannelResponse::success(request.id, value),
            Err(e) => {
                warn!(method = %request.method, error = %format!("{:#}", e), "Channel request failed");
                ChannelResponse::invalid_params(request.id, format!("{:#}", e))
            }
        }
    }
}

async fn write_line<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(value)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::notification::ChannelLink;
    use crate::platform::{MemoryPlatform, PlatformBindings};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    fn server() -> (BridgeServer, mpsc::UnboundedReceiver<PlatformEvent>, mpsc::UnboundedReceiver<Invocation>) {
        let (invocation_tx, invocation_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let platform = Arc::new(MemoryPlatform::new().with_permission(true));
        let relay = Relay::new(
            &RelayConfig::default(),
            PlatformBindings::memory(platform),
            Arc::new(ChannelLink::new(invocation_tx)),
        )
        .unwrap();
        (BridgeServer::new(Arc::new(relay), event_tx), event_rx, invocation_rx)
    }

    #[test]
    fn test_unknown_method() {
        let (server, _events, _invocations) = server();

        let response = server.handle_request(ChannelRequest::new(1, "bogus", None));

        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn test_line_without_id_gets_no_response() {
        let (server, _events, _invocations) = server();

        assert!(server.handle_line(r#"{"jsonrpc":"2.0","method":"cancelAll"}"#).is_none());
        assert!(server.handle_line("not json").is_none());
        assert!(server.handle_line("   ").is_none());
    }

    #[test]
    fn test_invalid_platform_params() {
        let (server, _events, _invocations) = server();

        let response = server.handle_request(ChannelRequest::new(2, "platform/posted", Some(json!({"title": "x"}))));

        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_run_with_writes_responses_and_notifications() {
        let (server, _events, invocations) = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"queryPermissionGranted"}"#,
            "\n",
            "garbage\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"show","params":{"logicalId":"A","title":"t"}}"#,
            "\n",
        );
        server.relay().pipeline().on_listener_connected();

        let mut output: Vec<u8> = Vec::new();
        server
            .run_with(BufReader::new(input.as_bytes()), &mut output, invocations)
            .await
            .unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&json!({"jsonrpc": "2.0", "method": "captureConnected"})));
        assert!(lines.contains(&json!({"jsonrpc": "2.0", "id": 1, "result": true})));
        assert!(lines.contains(&json!({"jsonrpc": "2.0", "id": 2, "result": true})));
    }
}
