//! 捕获侧 - 订阅系统通知流，过滤、规范化后转发给编排端

pub mod connection;
pub mod filter;
pub mod label;
pub mod pipeline;
pub mod service;

pub use connection::{ConnectionState, ConnectionStatus};
pub use filter::{PackageFilter, SYSTEM_PACKAGES};
pub use label::{resolve_label_or_package, AppLabelResolver, LookupError};
pub use pipeline::{CapturePipeline, ForwardOutcome};
pub use service::CaptureService;
