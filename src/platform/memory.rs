//! 内存平台 - 不依赖任何系统服务的完整平台实现
//!
//! 通知栏状态保存在内存里，可以模拟用户点击、划掉通知以及监听会话授予。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::{AppInventory, InstalledApp, ListenerHost, NotificationSurface, PlatformEvent, SurfaceError};
use crate::capture::label::{AppLabelResolver, LookupError};
use crate::dispatch::render::RenderedNotification;

/// 内存平台
#[derive(Default)]
pub struct MemoryPlatform {
    visible: Mutex<BTreeMap<i32, RenderedNotification>>,
    labels: Mutex<HashMap<String, String>>,
    apps: Mutex<Vec<InstalledApp>>,
    permission: AtomicBool,
    session_active: AtomicBool,
    fail_render: AtomicBool,
    render_count: AtomicUsize,
    settings_opened: AtomicUsize,
    events: Mutex<Option<UnboundedSender<PlatformEvent>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryPlatform {
    /// 创建未授权的内存平台
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置通知读取权限
    pub fn with_permission(self, granted: bool) -> Self {
        self.permission.store(granted, Ordering::SeqCst);
        self
    }

    /// 建立会话时自动回报 `ListenerConnected`
    pub fn with_auto_grant(self, events: UnboundedSender<PlatformEvent>) -> Self {
        *lock(&self.events) = Some(events);
        self
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// 之后的渲染全部失败
    pub fn set_fail_render(&self, fail: bool) {
        self.fail_render.store(fail, Ordering::SeqCst);
    }

    pub fn add_label(&self, package: impl Into<String>, label: impl Into<String>) {
        lock(&self.labels).insert(package.into(), label.into());
    }

    pub fn add_app(&self, app: InstalledApp) {
        lock(&self.apps).push(app);
    }

    /// 当前可见的通知
    pub fn visible(&self) -> Vec<(i32, RenderedNotification)> {
        lock(&self.visible)
            .iter()
            .map(|(id, n)| (*id, n.clone()))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        lock(&self.visible).len()
    }

    pub fn get(&self, platform_id: i32) -> Option<RenderedNotification> {
        lock(&self.visible).get(&platform_id).cloned()
    }

    /// 成功渲染的总次数（包括原地替换）
    pub fn render_count(&self) -> usize {
        self.render_count.load(Ordering::SeqCst)
    }

    pub fn settings_opened(&self) -> usize {
        self.settings_opened.load(Ordering::SeqCst)
    }

    pub fn session_active(&self) -> bool {
        self.session_active.load(Ordering::SeqCst)
    }

    /// 模拟用户划掉通知，返回删除动作产生的事件
    pub fn dismiss(&self, platform_id: i32) -> Option<PlatformEvent> {
        let removed = lock(&self.visible).remove(&platform_id)?;
        Some(PlatformEvent::Dismissed {
            logical_id: removed.dismiss_action.logical_id,
        })
    }

    /// 模拟用户点击通知，返回点击动作产生的事件
    pub fn tap(&self, platform_id: i32) -> Option<PlatformEvent> {
        let mut visible = lock(&self.visible);
        let notification = visible.get(&platform_id)?.clone();
        if notification.auto_cancel {
            visible.remove(&platform_id);
        }
        Some(PlatformEvent::Tapped(notification.tap_action))
    }
}

impl NotificationSurface for MemoryPlatform {
    fn render(&self, platform_id: i32, notification: &RenderedNotification) -> Result<(), SurfaceError> {
        if self.fail_render.load(Ordering::SeqCst) {
            return Err(SurfaceError::Render("surface unavailable".to_string()));
        }
        lock(&self.visible).insert(platform_id, notification.clone());
        self.render_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn retract(&self, platform_id: i32) -> Result<(), SurfaceError> {
        lock(&self.visible).remove(&platform_id);
        Ok(())
    }

    fn retract_channel(&self, channel_id: &str) -> Result<(), SurfaceError> {
        lock(&self.visible).retain(|_, n| n.channel_id != channel_id);
        Ok(())
    }
}

impl ListenerHost for MemoryPlatform {
    fn permission_granted(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn open_permission_settings(&self) -> Result<()> {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn start_session(&self) -> Result<()> {
        self.session_active.store(true, Ordering::SeqCst);
        if let Some(tx) = lock(&self.events).as_ref() {
            if tx.send(PlatformEvent::ListenerConnected).is_err() {
                debug!("Platform event queue closed, session grant not reported");
            }
        }
        Ok(())
    }

    fn stop_session(&self) -> Result<()> {
        self.session_active.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl AppLabelResolver for MemoryPlatform {
    fn resolve_label(&self, package: &str) -> Result<String, LookupError> {
        lock(&self.labels)
            .get(package)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(package.to_string()))
    }
}

impl AppInventory for MemoryPlatform {
    fn list_installed(&self) -> Result<Vec<InstalledApp>> {
        let mut apps = lock(&self.apps).clone();
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apps)
    }
}
