//! platform/* - 宿主适配层把平台回调推入事件队列
//!
//! 只入队，不等待处理；队列消费端已退出时返回 false。

use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use super::parse_params;
use crate::notification::{RawNotification, TapPayload};
use crate::platform::PlatformEvent;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DismissParams {
    #[serde(default, alias = "notificationId")]
    logical_id: Option<String>,
    #[serde(default)]
    platform_id: Option<i32>,
}

fn enqueue(events: &UnboundedSender<PlatformEvent>, event: PlatformEvent) -> Result<Value> {
    match events.send(event) {
        Ok(()) => Ok(json!(true)),
        Err(_) => {
            warn!("Platform event queue closed, callback dropped");
            Ok(json!(false))
        }
    }
}

pub fn handle_posted(events: &UnboundedSender<PlatformEvent>, params: Option<Value>) -> Result<Value> {
    let raw: RawNotification = parse_params(params)?;
    enqueue(events, PlatformEvent::Posted(raw))
}

pub fn handle_removed(events: &UnboundedSender<PlatformEvent>, params: Option<Value>) -> Result<Value> {
    let raw: RawNotification = parse_params(params)?;
    enqueue(events, PlatformEvent::Removed(raw))
}

pub fn handle_listener_connected(events: &UnboundedSender<PlatformEvent>) -> Result<Value> {
    enqueue(events, PlatformEvent::ListenerConnected)
}

pub fn handle_listener_disconnected(events: &UnboundedSender<PlatformEvent>) -> Result<Value> {
    enqueue(events, PlatformEvent::ListenerDisconnected)
}

/// 优先使用 logicalId；只有 platformId 时由派发侧反查
pub fn handle_dismissed(events: &UnboundedSender<PlatformEvent>, params: Option<Value>) -> Result<Value> {
    let params: DismissParams = parse_params(params)?;
    let event = match (params.logical_id, params.platform_id) {
        (Some(logical_id), _) if !logical_id.is_empty() => PlatformEvent::Dismissed { logical_id },
        (_, Some(platform_id)) => PlatformEvent::DismissedSlot { platform_id },
        _ => bail!("Missing logicalId or platformId"),
    };
    enqueue(events, event)
}

pub fn handle_tapped(events: &UnboundedSender<PlatformEvent>, params: Option<Value>) -> Result<Value> {
    let payload: TapPayload = parse_params(params)?;
    enqueue(events, PlatformEvent::Tapped(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_posted_accepts_original_field_names() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = handle_posted(
            &tx,
            Some(json!({"package": "com.thirdparty.chat", "title": "Hi", "text": "there", "time": 1000})),
        )
        .unwrap();

        assert_eq!(result, json!(true));
        assert_eq!(
            rx.try_recv().unwrap(),
            PlatformEvent::Posted(
                RawNotification::new("com.thirdparty.chat", 1000)
                    .with_title("Hi")
                    .with_text("there")
            )
        );
    }

    #[test]
    fn test_dismissed_prefers_logical_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle_dismissed(&tx, Some(json!({"logicalId": "A", "platformId": 5}))).unwrap();
        handle_dismissed(&tx, Some(json!({"platformId": 5}))).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            PlatformEvent::Dismissed { logical_id: "A".to_string() }
        );
        assert_eq!(rx.try_recv().unwrap(), PlatformEvent::DismissedSlot { platform_id: 5 });
        assert!(handle_dismissed(&tx, None).is_err());
    }

    #[test]
    fn test_closed_queue_reports_false() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        assert_eq!(handle_listener_connected(&tx).unwrap(), json!(false));
    }
}
