//! 通道方法处理函数
//!
//! 按方法族分文件：capture（监听控制）、dispatch（派发）、apps（应用清单）、
//! platform（宿主推送的平台回调）。

pub mod apps;
pub mod capture;
pub mod dispatch;
pub mod platform;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 把 params 解析成具体类型，缺失时按空对象处理
pub(crate) fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(params).context("Invalid params")
}
