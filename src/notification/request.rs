//! 派发侧请求结构

use serde::{Deserialize, Deserializer, Serialize};

/// 编排端发来的 show 请求
///
/// 字段名兼容旧版客户端：`notificationId` / `packageName` / `appName`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    #[serde(alias = "notificationId")]
    pub logical_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, alias = "packageName", deserialize_with = "null_as_empty")]
    pub source_package: String,
    #[serde(default, alias = "appName", deserialize_with = "null_as_empty")]
    pub source_app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_open_enabled: Option<bool>,
}

impl DispatchRequest {
    pub fn new(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            title: String::new(),
            body: String::new(),
            source_package: String::new(),
            source_app_name: String::new(),
            sound_enabled: None,
            vibration_enabled: None,
            auto_open_enabled: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_source(mut self, package: impl Into<String>, app_name: impl Into<String>) -> Self {
        self.source_package = package.into();
        self.source_app_name = app_name.into();
        self
    }

    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound_enabled = Some(enabled);
        self
    }

    pub fn with_vibration(mut self, enabled: bool) -> Self {
        self.vibration_enabled = Some(enabled);
        self
    }

    pub fn with_auto_open(mut self, enabled: bool) -> Self {
        self.auto_open_enabled = Some(enabled);
        self
    }

    /// 用默认值补齐缺省的渲染开关
    pub fn hints(&self, defaults: &DispatchDefaults) -> RenderHints {
        RenderHints {
            sound: self.sound_enabled.unwrap_or(defaults.sound),
            vibration: self.vibration_enabled.unwrap_or(defaults.vibration),
            auto_open: self.auto_open_enabled.unwrap_or(defaults.auto_open),
        }
    }
}

/// 文本字段缺省和 null 都按空串处理
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 请求未携带开关时使用的默认值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchDefaults {
    pub sound: bool,
    pub vibration: bool,
    pub auto_open: bool,
}

impl Default for DispatchDefaults {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
            auto_open: false,
        }
    }
}

/// 补齐后的渲染开关
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderHints {
    pub sound: bool,
    pub vibration: bool,
    pub auto_open: bool,
}

/// 点击派发通知时回传给编排端的数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapPayload {
    pub logical_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_package: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_app_name: String,
    #[serde(default)]
    pub auto_open_enabled: bool,
}

impl TapPayload {
    /// 从完整请求重建点击数据
    pub fn from_request(request: &DispatchRequest, hints: RenderHints) -> Self {
        Self {
            logical_id: request.logical_id.clone(),
            title: request.title.clone(),
            body: request.body.clone(),
            source_package: request.source_package.clone(),
            source_app_name: request.source_app_name.clone(),
            auto_open_enabled: hints.auto_open,
        }
    }
}
