//! 捕获服务 - 编排端的 start/stop/query 调用入口

use std::sync::Arc;

use tracing::{info, warn};

use super::pipeline::CapturePipeline;
use crate::platform::ListenerHost;

/// 捕获服务
pub struct CaptureService {
    host: Arc<dyn ListenerHost>,
    pipeline: Arc<CapturePipeline>,
}

impl CaptureService {
    pub fn new(host: Arc<dyn ListenerHost>, pipeline: Arc<CapturePipeline>) -> Self {
        Self { host, pipeline }
    }

    /// 开始监听
    ///
    /// 未授权时跳转到权限设置并返回 false；已授权时请求监听会话，
    /// 会话真正建立后由平台回调 `ListenerConnected`。
    pub fn start(&self) -> bool {
        if !self.host.permission_granted() {
            info!("Notification access not granted, opening permission settings");
            self.open_permission_settings();
            return false;
        }

        match self.host.start_session() {
            Ok(()) => {
                info!("Notification listener session requested");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to start notification listener session");
                false
            }
        }
    }

    /// 停止监听
    pub fn stop(&self) -> bool {
        let stopped = match self.host.stop_session() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to stop notification listener session");
                false
            }
        };
        self.pipeline.on_listener_disconnected();
        stopped
    }

    pub fn is_active(&self) -> bool {
        self.pipeline.connection().is_active()
    }

    pub fn permission_granted(&self) -> bool {
        self.host.permission_granted()
    }

    pub fn open_permission_settings(&self) {
        if let Err(e) = self.host.open_permission_settings() {
            warn!(error = %e, "Failed to open notification permission settings");
        }
    }
}
