//! 监听会话状态
//!
//! 单写者（平台会话生命周期）、多读者（编排端随时同步查询）。
//! 只有真正发生状态迁移时才发出 connected/disconnected 信号。

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use crate::notification::{EventSink, Invocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
}

/// 监听会话状态
#[derive(Debug, Default)]
pub struct ConnectionState {
    active: AtomicBool,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次观测到的状态，不阻塞、不失败
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.is_active() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    /// Disconnected → Connected，返回是否发生了迁移
    pub fn mark_connected(&self, sink: &dyn EventSink) -> bool {
        if self.active.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("Notification listener connected");
        if let Err(e) = sink.invoke(Invocation::CaptureConnected) {
            warn!(error = %e, "Failed to signal captureConnected");
        }
        true
    }

    /// Connected → Disconnected，返回是否发生了迁移
    pub fn mark_disconnected(&self, sink: &dyn EventSink) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        info!("Notification listener disconnected");
        if let Err(e) = sink.invoke(Invocation::CaptureDisconnected) {
            warn!(error = %e, "Failed to signal captureDisconnected");
        }
        true
    }
}
