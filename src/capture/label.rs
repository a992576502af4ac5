//! 应用名解析

use thiserror::Error;
use tracing::debug;

/// 应用名查询失败
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("application {0} is not installed")]
    NotFound(String),
    #[error("application {0} has no display label")]
    Unlabeled(String),
    #[error("label lookup failed: {0}")]
    Io(#[from] std::io::Error),
}

/// 根据包名查询可读的应用名
pub trait AppLabelResolver: Send + Sync {
    fn resolve_label(&self, package: &str) -> Result<String, LookupError>;
}

/// 查询应用名，失败时回退到包名
pub fn resolve_label_or_package(resolver: &dyn AppLabelResolver, package: &str) -> String {
    match resolver.resolve_label(package) {
        Ok(label) if !label.trim().is_empty() => label,
        Ok(_) => package.to_string(),
        Err(e) => {
            debug!(package = %package, error = %e, "App label lookup failed, using package name");
            package.to_string()
        }
    }
}
