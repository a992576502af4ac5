//! 派发侧 - 按编排端指令在本机显示、更新、撤回通知

pub mod identity;
pub mod ledger;
pub mod manager;
pub mod render;

pub use identity::{stable_hash, IdentityPolicy, FIXED_SLOT_ID};
pub use ledger::SuppressionLedger;
pub use manager::{DispatchManager, ShowOutcome};
pub use render::{DispatchChannel, DismissAction, Importance, RenderedNotification, Visibility};
