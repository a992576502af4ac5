//! 事件通道 - native 到编排端的单向调用
//!
//! 所有调用都是 fire-and-forget：发送方不等待、不重试，通道关闭时事件直接丢弃。

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use super::event::CapturedEvent;
use super::request::TapPayload;

/// native → 编排端的调用
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// 捕获到一条通知
    NotificationCaptured(CapturedEvent),
    /// 监听会话建立
    CaptureConnected,
    /// 监听会话断开
    CaptureDisconnected,
    /// 用户点击了派发的通知
    NotificationTapped(TapPayload),
}

impl Invocation {
    /// 通道上的方法名
    pub fn method(&self) -> &'static str {
        match self {
            Invocation::NotificationCaptured(_) => "onNotificationCaptured",
            Invocation::CaptureConnected => "captureConnected",
            Invocation::CaptureDisconnected => "captureDisconnected",
            Invocation::NotificationTapped(_) => "onNotificationTapped",
        }
    }

    /// 调用参数（无参数的信号返回 None）
    pub fn params(&self) -> Option<Value> {
        match self {
            Invocation::NotificationCaptured(event) => serde_json::to_value(event).ok(),
            Invocation::NotificationTapped(payload) => serde_json::to_value(payload).ok(),
            Invocation::CaptureConnected | Invocation::CaptureDisconnected => None,
        }
    }
}

/// 通道发送错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChannelError {
    #[error("event channel is not attached")]
    Detached,
    #[error("event channel closed")]
    Closed,
}

/// 通道 trait
pub trait EventSink: Send + Sync {
    /// 投递调用，立即返回
    fn invoke(&self, invocation: Invocation) -> Result<(), ChannelError>;
}

/// 基于 tokio 无界队列的通道端点
///
/// 队列另一端由 bridge 的写出任务消费并序列化到 stdout。
#[derive(Debug, Clone)]
pub struct ChannelLink {
    tx: Option<UnboundedSender<Invocation>>,
}

impl ChannelLink {
    pub fn new(tx: UnboundedSender<Invocation>) -> Self {
        Self { tx: Some(tx) }
    }

    /// 未连接的端点，所有调用都会失败
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn is_attached(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

impl EventSink for ChannelLink {
    fn invoke(&self, invocation: Invocation) -> Result<(), ChannelError> {
        let tx = self.tx.as_ref().ok_or(ChannelError::Detached)?;
        tx.send(invocation).map_err(|_| ChannelError::Closed)
    }
}
