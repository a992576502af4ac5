//! listInstalledApps

use anyhow::Result;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

use crate::platform::InstalledApp;
use crate::relay::Relay;

/// 通道上的应用条目，图标为 base64 文本
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppEntry {
    name: String,
    package_id: String,
    is_system: bool,
    icon: String,
}

impl From<InstalledApp> for AppEntry {
    fn from(app: InstalledApp) -> Self {
        Self {
            icon: base64::engine::general_purpose::STANDARD.encode(&app.icon),
            name: app.name,
            package_id: app.package_id,
            is_system: app.is_system,
        }
    }
}

pub fn handle_list_installed_apps(relay: &Relay) -> Result<Value> {
    let apps: Vec<AppEntry> = relay.installed_apps().into_iter().map(AppEntry::from).collect();
    Ok(serde_json::to_value(apps)?)
}
