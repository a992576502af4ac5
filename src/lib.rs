//! Notify Relay - 捕获系统通知转发给编排端，并按编排端指令在本机重现通知

pub mod bridge;
pub mod capture;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod notification;
pub mod platform;
pub mod relay;

pub use bridge::{BridgeServer, ChannelNotification, ChannelRequest, ChannelResponse};
pub use capture::{
    AppLabelResolver, CapturePipeline, CaptureService, ConnectionState, ForwardOutcome, LookupError,
    PackageFilter,
};
pub use config::RelayConfig;
pub use dispatch::{stable_hash, DispatchManager, IdentityPolicy, ShowOutcome, SuppressionLedger};
pub use notification::{
    CapturedEvent, ChannelLink, DispatchRequest, EventSink, Invocation, Journal, RawNotification,
    TapPayload,
};
pub use platform::{
    AppInventory, InstalledApp, ListenerHost, MemoryPlatform, NotificationSurface, PlatformBindings,
    PlatformEvent,
};
pub use relay::Relay;
