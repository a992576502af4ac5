//! 来源过滤 - 丢弃自身和系统产生的通知，避免回环

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

/// 系统内置的保留包名：OS 核心、系统 UI、系统设置
pub const SYSTEM_PACKAGES: [&str; 3] = ["android", "com.android.systemui", "com.android.settings"];

/// 来源过滤器
#[derive(Debug, Clone)]
pub struct PackageFilter {
    reserved: HashSet<String>,
    patterns: Vec<Regex>,
}

impl PackageFilter {
    /// 保留集合 = 自身包名 + 系统包名
    pub fn new(self_package: &str) -> Self {
        let mut reserved: HashSet<String> = SYSTEM_PACKAGES.iter().map(|p| p.to_string()).collect();
        reserved.insert(self_package.to_string());
        Self {
            reserved,
            patterns: Vec::new(),
        }
    }

    /// 追加额外的保留包名
    pub fn with_reserved<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(packages.into_iter().map(Into::into));
        self
    }

    /// 追加排除正则
    pub fn with_patterns(mut self, patterns: &[String]) -> Result<Self> {
        for pattern in patterns {
            let regex = Regex::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
            self.patterns.push(regex);
        }
        Ok(self)
    }

    /// 是否属于保留集合
    pub fn is_reserved(&self, package: &str) -> bool {
        self.reserved.contains(package)
    }

    /// 是否应丢弃
    pub fn is_excluded(&self, package: &str) -> bool {
        self.is_reserved(package) || self.patterns.iter().any(|re| re.is_match(package))
    }
}
