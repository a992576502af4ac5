//! 平台接缝 - 系统通知栏、监听会话、应用清单
//!
//! 核心逻辑只依赖这里的 trait，具体平台由宿主注入：
//! - `memory` - 内存实现，测试和无头服务使用
//! - `desktop` - Linux 桌面实现（.desktop 应用名，可选 notify-rust 渲染）

pub mod desktop;
pub mod memory;

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::label::AppLabelResolver;
use crate::dispatch::render::RenderedNotification;
use crate::notification::{RawNotification, TapPayload};

pub use desktop::DesktopEntryResolver;
pub use memory::MemoryPlatform;

/// 图标缩略图的最大边长（像素）
pub const MAX_ICON_PX: u32 = 96;

/// 平台回调事件，由平台适配线程送入单消费者队列
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// 系统发布了一条通知
    Posted(RawNotification),
    /// 系统移除了一条通知
    Removed(RawNotification),
    /// 平台授予了监听会话
    ListenerConnected,
    /// 监听会话丢失
    ListenerDisconnected,
    /// 用户从通知栏划掉了派发的通知（删除动作携带 logical id）
    Dismissed { logical_id: String },
    /// 平台只报告了被划掉的 platform id
    DismissedSlot { platform_id: i32 },
    /// 用户点击了派发的通知
    Tapped(TapPayload),
}

/// 渲染/撤回失败
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to render notification: {0}")]
    Render(String),
    #[error("failed to retract notification: {0}")]
    Retract(String),
}

/// 系统通知栏
pub trait NotificationSurface: Send + Sync {
    /// 在 platform_id 处渲染，已存在时原地替换
    fn render(&self, platform_id: i32, notification: &RenderedNotification) -> Result<(), SurfaceError>;

    /// 撤回 platform_id 处的通知，不存在时视为成功
    fn retract(&self, platform_id: i32) -> Result<(), SurfaceError>;

    /// 撤回某个通知渠道下的全部通知
    fn retract_channel(&self, channel_id: &str) -> Result<(), SurfaceError>;
}

/// 通知监听会话的宿主
pub trait ListenerHost: Send + Sync {
    /// 是否已授予通知读取权限（无副作用）
    fn permission_granted(&self) -> bool;

    /// 跳转到系统权限设置
    fn open_permission_settings(&self) -> Result<()>;

    /// 请求建立监听会话；授予结果通过 `PlatformEvent::ListenerConnected` 异步回报
    fn start_session(&self) -> Result<()>;

    /// 结束监听会话
    fn stop_session(&self) -> Result<()>;
}

/// 已安装应用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledApp {
    pub name: String,
    pub package_id: String,
    pub is_system: bool,
    /// 压缩后的缩略图，边长不超过 `MAX_ICON_PX`，可能为空
    #[serde(default)]
    pub icon: Vec<u8>,
}

/// 已安装应用清单（只读，可重复调用）
pub trait AppInventory: Send + Sync {
    fn list_installed(&self) -> Result<Vec<InstalledApp>>;
}

/// 注入到 Relay 的一组平台实现
#[derive(Clone)]
pub struct PlatformBindings {
    pub surface: Arc<dyn NotificationSurface>,
    pub host: Arc<dyn ListenerHost>,
    pub resolver: Arc<dyn AppLabelResolver>,
    pub inventory: Arc<dyn AppInventory>,
}

impl PlatformBindings {
    /// 全部由同一个内存平台提供
    pub fn memory(platform: Arc<MemoryPlatform>) -> Self {
        Self {
            surface: platform.clone(),
            host: platform.clone(),
            resolver: platform.clone(),
            inventory: platform,
        }
    }
}
