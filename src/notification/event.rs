//! 捕获侧事件结构
//!
//! `RawNotification` 是平台回调交给我们的原始通知，`CapturedEvent` 是过滤、
//! 规范化之后转发给编排端的稳定事件模型。

use serde::{Deserialize, Serialize};

/// 平台回调中的原始通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    /// 来源应用标识（包名）
    #[serde(alias = "package")]
    pub package_name: String,
    /// 标题
    #[serde(default)]
    pub title: Option<String>,
    /// 正文
    #[serde(default)]
    pub text: Option<String>,
    /// 平台发布时间（毫秒）
    #[serde(alias = "time")]
    pub post_time: i64,
}

impl RawNotification {
    pub fn new(package_name: impl Into<String>, post_time: i64) -> Self {
        Self {
            package_name: package_name.into(),
            title: None,
            text: None,
            post_time,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// 规范化后的捕获事件，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedEvent {
    logical_id: String,
    source_package: String,
    source_app_name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    posted_at: i64,
}

impl CapturedEvent {
    /// 由原始通知和已解析的应用名构造事件
    ///
    /// logical_id 直接取发布时间的十进制字符串，毫秒精度下视为唯一。
    pub fn from_raw(raw: &RawNotification, source_app_name: impl Into<String>) -> Self {
        Self {
            logical_id: raw.post_time.to_string(),
            source_package: raw.package_name.clone(),
            source_app_name: source_app_name.into(),
            title: raw.title.clone(),
            body: raw.text.clone(),
            posted_at: raw.post_time,
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn source_package(&self) -> &str {
        &self.source_package
    }

    pub fn source_app_name(&self) -> &str {
        &self.source_app_name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn posted_at(&self) -> i64 {
        self.posted_at
    }
}
