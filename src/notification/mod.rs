//! 通知数据模型与事件通道
//!
//! - `event` - 捕获侧的原始通知与规范化事件
//! - `request` - 派发侧的 show 请求、渲染开关和点击数据
//! - `channel` - native → 编排端的 fire-and-forget 调用
//! - `store` - 可选的诊断日志

pub mod channel;
pub mod event;
pub mod request;
pub mod store;

pub use channel::{ChannelError, ChannelLink, EventSink, Invocation};
pub use event::{CapturedEvent, RawNotification};
pub use request::{DispatchDefaults, DispatchRequest, RenderHints, TapPayload};
pub use store::{Journal, JournalKind, JournalRecord, JournalWriter};
