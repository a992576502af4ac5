//! 派发管理器 - 在本机重现通知并跟踪其生命周期
//!
//! show 幂等：同一 logical id 总是落在同一个 platform id 上原地替换；
//! 用户划掉过的 logical id 记入抑制账本，之后的 show 静默忽略，直到账本被清空。
//! 程序调用 cancel 不算用户划掉。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::identity::IdentityPolicy;
use super::ledger::SuppressionLedger;
use super::render::{DispatchChannel, RenderedNotification};
use crate::notification::store::{JournalKind, JournalRecord, JournalWriter};
use crate::notification::{DispatchDefaults, DispatchRequest};
use crate::platform::NotificationSurface;

/// show 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowOutcome {
    /// 已渲染；replaced 表示覆盖了同槽位上已有的通知
    Shown { platform_id: i32, replaced: bool },
    /// logical id 在抑制账本中，未产生可见效果
    Suppressed,
    /// 渲染失败或请求无效
    Failed(String),
}

impl ShowOutcome {
    /// 报告给编排端的布尔结果；被抑制也算调用成功
    pub fn is_success(&self) -> bool {
        !matches!(self, ShowOutcome::Failed(_))
    }
}

/// 派发管理器
pub struct DispatchManager {
    surface: Arc<dyn NotificationSurface>,
    ledger: SuppressionLedger,
    policy: IdentityPolicy,
    channel: DispatchChannel,
    defaults: DispatchDefaults,
    /// 本组件持有的 platform id → logical id
    owned: Mutex<HashMap<i32, String>>,
    journal: Option<JournalWriter>,
}

impl DispatchManager {
    pub fn new(surface: Arc<dyn NotificationSurface>) -> Self {
        Self {
            surface,
            ledger: SuppressionLedger::new(),
            policy: IdentityPolicy::default(),
            channel: DispatchChannel::default(),
            defaults: DispatchDefaults::default(),
            owned: Mutex::new(HashMap::new()),
            journal: None,
        }
    }

    pub fn with_policy(mut self, policy: IdentityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_channel(mut self, channel: DispatchChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_defaults(mut self, defaults: DispatchDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_journal(mut self, journal: Option<JournalWriter>) -> Self {
        self.journal = journal;
        self
    }

    fn owned(&self) -> MutexGuard<'_, HashMap<i32, String>> {
        self.owned.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, record: JournalRecord) {
        if let Some(journal) = &self.journal {
            journal.record(record);
        }
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    pub fn channel(&self) -> &DispatchChannel {
        &self.channel
    }

    pub fn ledger(&self) -> &SuppressionLedger {
        &self.ledger
    }

    pub fn platform_id(&self, logical_id: &str) -> i32 {
        self.policy.platform_id(logical_id)
    }

    pub fn is_suppressed(&self, logical_id: &str) -> bool {
        self.ledger.contains(logical_id)
    }

    /// 当前持有的通知数量
    pub fn owned_count(&self) -> usize {
        self.owned().len()
    }

    /// 显示或原地更新一条通知
    pub fn show(&self, request: &DispatchRequest) -> ShowOutcome {
        let logical_id = request.logical_id.as_str();
        if logical_id.is_empty() {
            warn!("Rejecting show request without logical id");
            return ShowOutcome::Failed("missing logical id".to_string());
        }

        if self.ledger.contains(logical_id) {
            debug!(logical_id = %logical_id, "Show suppressed, notification was dismissed by user");
            self.record(
                JournalRecord::new(JournalKind::Suppressed)
                    .logical_id(logical_id)
                    .summary(&request.title),
            );
            return ShowOutcome::Suppressed;
        }

        let platform_id = self.policy.platform_id(logical_id);
        let hints = request.hints(&self.defaults);
        let notification = RenderedNotification::build(request, hints, platform_id, &self.channel);

        match self.surface.render(platform_id, &notification) {
            Ok(()) => {
                let replaced = self
                    .owned()
                    .insert(platform_id, logical_id.to_string())
                    .is_some();
                info!(
                    logical_id = %logical_id,
                    platform_id,
                    replaced,
                    sound = hints.sound,
                    vibration = hints.vibration,
                    "Notification shown"
                );
                self.record(
                    JournalRecord::new(JournalKind::Shown)
                        .logical_id(logical_id)
                        .package(request.source_package.as_str())
                        .summary(&request.title),
                );
                ShowOutcome::Shown {
                    platform_id,
                    replaced,
                }
            }
            Err(e) => {
                warn!(logical_id = %logical_id, platform_id, error = %e, "Failed to show notification");
                ShowOutcome::Failed(e.to_string())
            }
        }
    }

    /// 撤回通知，不写入抑制账本
    pub fn cancel(&self, logical_id: &str) -> bool {
        let platform_id = self.policy.platform_id(logical_id);
        match self.surface.retract(platform_id) {
            Ok(()) => {
                self.owned().remove(&platform_id);
                info!(logical_id = %logical_id, platform_id, "Notification cancelled");
                self.record(JournalRecord::new(JournalKind::Cancelled).logical_id(logical_id));
                true
            }
            Err(e) => {
                warn!(logical_id = %logical_id, platform_id, error = %e, "Failed to cancel notification");
                false
            }
        }
    }

    /// 撤回派发渠道下的全部通知，不影响抑制账本
    pub fn cancel_all(&self) -> bool {
        match self.surface.retract_channel(&self.channel.id) {
            Ok(()) => {
                let count = {
                    let mut owned = self.owned();
                    let count = owned.len();
                    owned.clear();
                    count
                };
                info!(channel = %self.channel.id, count, "All dispatched notifications cancelled");
                self.record(JournalRecord::new(JournalKind::Cancelled).summary("all"));
                true
            }
            Err(e) => {
                warn!(channel = %self.channel.id, error = %e, "Failed to cancel dispatched notifications");
                false
            }
        }
    }

    /// 释放 logical id 当前占用的槽位；槽位已被别的 id 覆盖时保持不变
    fn release(&self, logical_id: &str) -> (i32, bool) {
        let platform_id = self.policy.platform_id(logical_id);
        let mut owned = self.owned();
        let released = owned.get(&platform_id).is_some_and(|id| id == logical_id);
        if released {
            owned.remove(&platform_id);
        }
        (platform_id, released)
    }

    /// 用户点击了通知，通知随点击自动移除，不写入抑制账本
    pub fn on_tapped(&self, logical_id: &str) -> bool {
        let (platform_id, released) = self.release(logical_id);
        debug!(logical_id = %logical_id, platform_id, released, "Tapped notification auto-cancelled");
        released
    }

    /// 用户从通知栏划掉了通知
    pub fn on_user_dismissed(&self, logical_id: &str) {
        let (platform_id, _) = self.release(logical_id);

        let inserted = self.ledger.insert(logical_id);
        info!(logical_id = %logical_id, platform_id, inserted, "Notification dismissed by user, suppressing");
        self.record(JournalRecord::new(JournalKind::Dismissed).logical_id(logical_id));
    }

    /// 平台只报告了 platform id 时，反查 logical id 后按用户划掉处理
    pub fn on_platform_removed(&self, platform_id: i32) -> Option<String> {
        let logical_id = self.owned().get(&platform_id).cloned();
        match logical_id {
            Some(logical_id) => {
                self.on_user_dismissed(&logical_id);
                Some(logical_id)
            }
            None => {
                debug!(platform_id, "Dismissed slot is not owned by dispatch, ignoring");
                None
            }
        }
    }

    /// 清空抑制账本，返回清除的条目数
    pub fn clear_suppression_ledger(&self) -> usize {
        let cleared = self.ledger.clear();
        info!(cleared, "Suppression ledger cleared");
        self.record(JournalRecord::new(JournalKind::LedgerCleared).summary(&cleared.to_string()));
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::identity::{stable_hash, FIXED_SLOT_ID};
    use crate::platform::{MemoryPlatform, SurfaceError};

    fn manager() -> (Arc<MemoryPlatform>, DispatchManager) {
        let platform = Arc::new(MemoryPlatform::new());
        let manager = DispatchManager::new(platform.clone());
        (platform, manager)
    }

    fn request(id: &str, title: &str) -> DispatchRequest {
        DispatchRequest::new(id).with_title(title).with_body("body")
    }

    #[test]
    fn test_tap_releases_slot_without_suppressing() {
        let (platform, manager) = manager();
        manager.show(&request("A", "first"));

        platform.tap(stable_hash("A"));
        assert!(manager.on_tapped("A"));

        assert_eq!(manager.owned_count(), 0);
        assert!(!manager.is_suppressed("A"));
        assert_eq!(
            manager.show(&request("A", "again")),
            ShowOutcome::Shown {
                platform_id: stable_hash("A"),
                replaced: false
            }
        );
        // 未持有的 id 不受影响
        assert!(!manager.on_tapped("B"));
        assert_eq!(manager.owned_count(), 1);
    }

    #[test]
    fn test_show_renders_at_stable_hash() {
        let (platform, manager) = manager();

        let outcome = manager.show(&request("A", "first"));

        assert_eq!(
            outcome,
            ShowOutcome::Shown {
                platform_id: stable_hash("A"),
                replaced: false
            }
        );
        assert_eq!(platform.get(stable_hash("A")).unwrap().title, "first");
    }

    #[test]
    fn test_repeated_show_replaces_in_place() {
        let (platform, manager) = manager();

        manager.show(&request("A", "first"));
        let outcome = manager.show(&request("A", "second"));

        assert!(matches!(outcome, ShowOutcome::Shown { replaced: true, .. }));
        assert_eq!(platform.visible_count(), 1);
        assert_eq!(platform.get(stable_hash("A")).unwrap().title, "second");
    }

    #[test]
    fn test_distinct_ids_coexist() {
        let (platform, manager) = manager();

        manager.show(&request("A", "a"));
        manager.show(&request("B", "b"));

        assert_eq!(platform.visible_count(), 2);
        assert_eq!(manager.owned_count(), 2);
    }

    #[test]
    fn test_dismissed_id_is_suppressed() {
        let (platform, manager) = manager();

        manager.show(&request("A", "first"));
        manager.on_user_dismissed("A");
        platform.retract(stable_hash("A")).unwrap();

        let outcome = manager.show(&request("A", "again"));

        assert_eq!(outcome, ShowOutcome::Suppressed);
        assert!(outcome.is_success());
        assert_eq!(platform.visible_count(), 0);
        assert!(manager.is_suppressed("A"));
    }

    #[test]
    fn test_clear_ledger_allows_show() {
        let (platform, manager) = manager();

        manager.on_user_dismissed("A");
        assert_eq!(manager.clear_suppression_ledger(), 1);

        assert!(matches!(manager.show(&request("A", "x")), ShowOutcome::Shown { .. }));
        assert_eq!(platform.visible_count(), 1);
    }

    #[test]
    fn test_cancel_is_not_suppression() {
        let (platform, manager) = manager();

        manager.show(&request("B", "x"));
        assert!(manager.cancel("B"));
        assert_eq!(platform.visible_count(), 0);
        assert!(!manager.is_suppressed("B"));

        assert!(matches!(manager.show(&request("B", "y")), ShowOutcome::Shown { replaced: false, .. }));
        assert_eq!(platform.visible_count(), 1);
    }

    #[test]
    fn test_cancel_all_keeps_ledger() {
        let (platform, manager) = manager();

        manager.show(&request("A", "a"));
        manager.show(&request("B", "b"));
        manager.on_user_dismissed("C");

        assert!(manager.cancel_all());
        assert_eq!(platform.visible_count(), 0);
        assert_eq!(manager.owned_count(), 0);
        assert!(manager.is_suppressed("C"));
    }

    #[test]
    fn test_platform_removed_reverse_maps() {
        let (_platform, manager) = manager();

        manager.show(&request("A", "a"));
        let logical = manager.on_platform_removed(stable_hash("A"));

        assert_eq!(logical.as_deref(), Some("A"));
        assert!(manager.is_suppressed("A"));
        assert_eq!(manager.on_platform_removed(12345), None);
    }

    #[test]
    fn test_render_failure_reports_failed() {
        let (platform, manager) = manager();
        platform.set_fail_render(true);

        let outcome = manager.show(&request("A", "a"));

        assert!(matches!(outcome, ShowOutcome::Failed(_)));
        assert!(!outcome.is_success());
        assert_eq!(manager.owned_count(), 0);
    }

    #[test]
    fn test_empty_logical_id_rejected() {
        let (platform, manager) = manager();

        assert!(!manager.show(&request("", "a")).is_success());
        assert_eq!(platform.render_count(), 0);
    }

    #[test]
    fn test_fixed_slot_policy_replaces_across_ids() {
        let platform = Arc::new(MemoryPlatform::new());
        let manager = DispatchManager::new(platform.clone()).with_policy(IdentityPolicy::FixedSlot);

        manager.show(&request("A", "a"));
        let outcome = manager.show(&request("B", "b"));

        assert_eq!(
            outcome,
            ShowOutcome::Shown {
                platform_id: FIXED_SLOT_ID,
                replaced: true
            }
        );
        assert_eq!(platform.visible_count(), 1);
        assert_eq!(platform.get(FIXED_SLOT_ID).unwrap().title, "b");
    }

    struct BrokenSurface;

    impl NotificationSurface for BrokenSurface {
        fn render(&self, _: i32, _: &RenderedNotification) -> Result<(), SurfaceError> {
            Err(SurfaceError::Render("no surface".to_string()))
        }

        fn retract(&self, _: i32) -> Result<(), SurfaceError> {
            Err(SurfaceError::Retract("no surface".to_string()))
        }

        fn retract_channel(&self, _: &str) -> Result<(), SurfaceError> {
            Err(SurfaceError::Retract("no surface".to_string()))
        }
    }

    #[test]
    fn test_retract_failures_report_false() {
        let manager = DispatchManager::new(Arc::new(BrokenSurface));

        assert!(!manager.cancel("A"));
        assert!(!manager.cancel_all());
    }
}
