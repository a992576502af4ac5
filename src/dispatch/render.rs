//! 派发通知的渲染描述

use serde::{Deserialize, Serialize};

use crate::notification::{DispatchRequest, RenderHints, TapPayload};

/// 所有派发通知共用的分组键
pub const GROUP_KEY: &str = "relay_notifications";
/// 开启振动时使用的节奏（毫秒）
pub const VIBRATION_PATTERN_MS: [u64; 4] = [0, 500, 500, 500];

/// 派发通知所在的系统通知渠道
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub importance: Importance,
    /// 锁屏上的可见性
    pub visibility: Visibility,
}

impl Default for DispatchChannel {
    fn default() -> Self {
        Self {
            id: "relay_dispatch_channel".to_string(),
            name: "Mirrored notifications".to_string(),
            description: "Notifications mirrored from the paired device".to_string(),
            importance: Importance::High,
            visibility: Visibility::Public,
        }
    }
}

/// 渠道重要性，High 时弹出横幅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Default,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// 锁屏显示完整内容
    Public,
    /// 锁屏只显示应用名
    Private,
    /// 锁屏不显示
    Secret,
}

/// 用户划掉通知时平台回送的删除动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DismissAction {
    pub logical_id: String,
}

/// 交给平台渲染的完整通知
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub importance: Importance,
    pub visibility: Visibility,
    pub category: &'static str,
    pub group: &'static str,
    /// 点击后自动移除
    pub auto_cancel: bool,
    /// 原地更新时不再次提醒
    pub only_alert_once: bool,
    pub sound: bool,
    pub vibration: Option<Vec<u64>>,
    /// 点击/删除动作的 request code，与 platform id 相同
    pub request_code: i32,
    pub tap_action: TapPayload,
    pub dismiss_action: DismissAction,
}

impl RenderedNotification {
    pub fn build(
        request: &DispatchRequest,
        hints: RenderHints,
        platform_id: i32,
        channel: &DispatchChannel,
    ) -> Self {
        Self {
            channel_id: channel.id.clone(),
            title: request.title.clone(),
            body: request.body.clone(),
            importance: channel.importance,
            visibility: channel.visibility,
            category: "message",
            group: GROUP_KEY,
            auto_cancel: true,
            only_alert_once: true,
            sound: hints.sound,
            vibration: hints.vibration.then(|| VIBRATION_PATTERN_MS.to_vec()),
            request_code: platform_id,
            tap_action: TapPayload::from_request(request, hints),
            dismiss_action: DismissAction {
                logical_id: request.logical_id.clone(),
            },
        }
    }
}
