//! Linux 桌面平台
//!
//! 应用名和应用清单来自 XDG `.desktop` 文件；开启 `desktop` feature 时
//! 用 notify-rust 在桌面通知服务上渲染派发的通知。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{AppInventory, InstalledApp};
use crate::capture::label::{AppLabelResolver, LookupError};

/// 系统级 .desktop 目录
const SYSTEM_APP_DIRS: [&str; 2] = ["/usr/share/applications", "/usr/local/share/applications"];

/// 从 .desktop 文件解析应用名
#[derive(Debug, Clone)]
pub struct DesktopEntryResolver {
    dirs: Vec<PathBuf>,
}

impl DesktopEntryResolver {
    /// 用户目录优先，其次是系统目录
    pub fn new() -> Self {
        let mut search_dirs: Vec<PathBuf> = Vec::new();
        if let Some(data) = dirs::data_dir() {
            search_dirs.push(data.join("applications"));
        }
        search_dirs.extend(SYSTEM_APP_DIRS.iter().map(PathBuf::from));
        Self { dirs: search_dirs }
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    fn is_system_dir(dir: &Path) -> bool {
        SYSTEM_APP_DIRS.iter().any(|d| dir == Path::new(d))
    }
}

impl Default for DesktopEntryResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// `[Desktop Entry]` 段中需要的字段
#[derive(Debug, Default, PartialEq)]
struct DesktopEntry {
    name: Option<String>,
    no_display: bool,
}

fn parse_desktop_entry(content: &str) -> DesktopEntry {
    let mut entry = DesktopEntry::default();
    let mut in_main = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_main = line == "[Desktop Entry]";
            continue;
        }
        if !in_main {
            continue;
        }
        if let Some(value) = line.strip_prefix("Name=") {
            entry.name.get_or_insert_with(|| value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("NoDisplay=") {
            entry.no_display = value.trim().eq_ignore_ascii_case("true");
        }
    }

    entry
}

impl AppLabelResolver for DesktopEntryResolver {
    fn resolve_label(&self, package: &str) -> Result<String, LookupError> {
        let file_name = format!("{}.desktop", package);
        for dir in &self.dirs {
            let path = dir.join(&file_name);
            if !path.is_file() {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            return parse_desktop_entry(&content)
                .name
                .filter(|name| !name.is_empty())
                .ok_or_else(|| LookupError::Unlabeled(package.to_string()));
        }
        Err(LookupError::NotFound(package.to_string()))
    }
}

impl AppInventory for DesktopEntryResolver {
    fn list_installed(&self) -> Result<Vec<InstalledApp>> {
        let mut apps: Vec<InstalledApp> = Vec::new();

        for dir in &self.dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
                    continue;
                }
                let Some(package_id) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                // 用户目录里的同名条目覆盖系统条目
                if apps.iter().any(|a| a.package_id == package_id) {
                    continue;
                }
                let Ok(content) = fs::read_to_string(&path) else {
                    continue;
                };
                let parsed = parse_desktop_entry(&content);
                if parsed.no_display {
                    continue;
                }
                apps.push(InstalledApp {
                    name: parsed.name.unwrap_or_else(|| package_id.to_string()),
                    package_id: package_id.to_string(),
                    is_system: Self::is_system_dir(dir),
                    icon: Vec::new(),
                });
            }
        }

        apps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apps)
    }
}

/// platform id → (渠道, 桌面通知句柄)
///
/// 桌面通知服务自己分配通知 id，原地替换必须带上上一次返回的 id。
#[cfg_attr(not(all(feature = "desktop", target_os = "linux")), allow(dead_code))]
#[derive(Debug)]
struct SlotTable<H> {
    slots: HashMap<i32, (String, H)>,
}

#[cfg_attr(not(all(feature = "desktop", target_os = "linux")), allow(dead_code))]
impl<H> SlotTable<H> {
    fn new() -> Self {
        Self { slots: HashMap::new() }
    }

    /// 取出槽位上已有的句柄，渲染前调用
    fn take(&mut self, platform_id: i32) -> Option<H> {
        self.slots.remove(&platform_id).map(|(_, handle)| handle)
    }

    fn insert(&mut self, platform_id: i32, channel_id: &str, handle: H) {
        self.slots.insert(platform_id, (channel_id.to_string(), handle));
    }

    /// 取出某个渠道下的全部句柄
    fn drain_channel(&mut self, channel_id: &str) -> Vec<H> {
        let ids: Vec<i32> = self
            .slots
            .iter()
            .filter(|(_, (channel, _))| channel == channel_id)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter().filter_map(|id| self.take(id)).collect()
    }
}

#[cfg(all(feature = "desktop", target_os = "linux"))]
pub use surface::DesktopSurface;

#[cfg(all(feature = "desktop", target_os = "linux"))]
mod surface {
    use std::sync::{Mutex, MutexGuard};

    use notify_rust::{Hint, Notification, NotificationHandle, Timeout, Urgency};
    use tracing::debug;

    use super::SlotTable;
    use crate::dispatch::render::{Importance, RenderedNotification};
    use crate::platform::{NotificationSurface, SurfaceError};

    /// notify-rust 桌面通知
    ///
    /// 桌面通知服务不回报用户关闭，所以这里不会产生 Dismissed 事件。
    pub struct DesktopSurface {
        app_name: String,
        handles: Mutex<SlotTable<NotificationHandle>>,
    }

    impl DesktopSurface {
        pub fn new(app_name: impl Into<String>) -> Self {
            Self {
                app_name: app_name.into(),
                handles: Mutex::new(SlotTable::new()),
            }
        }

        fn handles(&self) -> MutexGuard<'_, SlotTable<NotificationHandle>> {
            self.handles.lock().unwrap_or_else(|e| e.into_inner())
        }
    }

    impl NotificationSurface for DesktopSurface {
        fn render(&self, platform_id: i32, n: &RenderedNotification) -> Result<(), SurfaceError> {
            let mut notification = Notification::new();
            notification
                .appname(&self.app_name)
                .summary(&n.title)
                .body(&n.body)
                .timeout(Timeout::Never);
            if !n.sound {
                notification.hint(Hint::SuppressSound(true));
            }
            let urgency = match n.importance {
                Importance::Low => Urgency::Low,
                Importance::Default => Urgency::Normal,
                Importance::High => Urgency::Critical,
            };
            notification.hint(Hint::Urgency(urgency));

            let mut handles = self.handles();
            let previous = handles.take(platform_id);
            // 带上服务端分配的 id，原地替换而不是叠加一条新通知
            if let Some(previous) = &previous {
                notification.id(previous.id());
            }

            match notification.show() {
                Ok(handle) => {
                    handles.insert(platform_id, &n.channel_id, handle);
                    Ok(())
                }
                Err(e) => {
                    if let Some(previous) = previous {
                        handles.insert(platform_id, &n.channel_id, previous);
                    }
                    Err(SurfaceError::Render(e.to_string()))
                }
            }
        }

        fn retract(&self, platform_id: i32) -> Result<(), SurfaceError> {
            let handle = self.handles().take(platform_id);
            match handle {
                Some(handle) => handle.close(),
                None => debug!(platform_id, "No desktop notification to retract"),
            }
            Ok(())
        }

        fn retract_channel(&self, channel_id: &str) -> Result<(), SurfaceError> {
            let drained = self.handles().drain_channel(channel_id);
            for handle in drained {
                handle.close();
            }
            Ok(())
        }
    }
}
