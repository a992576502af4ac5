//! 事件通道端点 - 与编排端之间按行传输的 JSON-RPC 2.0

pub mod handlers;
pub mod server;
pub mod types;

pub use server::BridgeServer;
pub use types::{ChannelErrorObject, ChannelNotification, ChannelRequest, ChannelResponse};
