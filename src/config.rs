//! 配置 - JSON 文件，所有字段都有默认值

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::capture::PackageFilter;
use crate::dispatch::{DispatchChannel, IdentityPolicy};
use crate::notification::{DispatchDefaults, Journal};

/// 默认的自身包名
pub const DEFAULT_SELF_PACKAGE: &str = "com.notifyrelay.app";

/// 诊断日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub path: Option<PathBuf>,
    pub max_records: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: None,
            max_records: 200,
        }
    }
}

impl JournalConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(Journal::default_path)
    }

    /// 未启用时返回 None
    pub fn open(&self) -> Option<Journal> {
        self.enabled
            .then(|| Journal::new(self.resolved_path(), self.max_records))
    }
}

/// 中继配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// 本应用自身的包名，捕获时总是过滤
    pub self_package: String,
    /// 额外的保留包名
    pub reserved_packages: Vec<String>,
    /// 额外的排除正则
    pub exclude_patterns: Vec<String>,
    pub identity_policy: IdentityPolicy,
    pub dispatch_channel: DispatchChannel,
    pub defaults: DispatchDefaults,
    /// 定期清空抑制账本的间隔（秒），0 表示不清空
    pub ledger_clear_interval_secs: u64,
    pub journal: JournalConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            self_package: DEFAULT_SELF_PACKAGE.to_string(),
            reserved_packages: Vec::new(),
            exclude_patterns: Vec::new(),
            identity_policy: IdentityPolicy::default(),
            dispatch_channel: DispatchChannel::default(),
            defaults: DispatchDefaults::default(),
            ledger_clear_interval_secs: 24 * 60 * 60,
            journal: JournalConfig::default(),
        }
    }
}

impl RelayConfig {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("notify-relay")
            .join("config.json")
    }

    /// 读取配置
    ///
    /// 显式指定的文件必须存在；默认路径不存在时使用默认配置。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: RelayConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// 检查正则等需要提前失败的字段
    pub fn validate(&self) -> Result<()> {
        self.package_filter().map(|_| ())
    }

    /// 构建捕获过滤器
    pub fn package_filter(&self) -> Result<PackageFilter> {
        PackageFilter::new(&self.self_package)
            .with_reserved(self.reserved_packages.iter().cloned())
            .with_patterns(&self.exclude_patterns)
    }
}
