//! Relay - 把捕获、派发和平台事件队列组装在一起
//!
//! 平台回调只入队；`run_platform_loop` 是唯一的消费者，逐个同步处理。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::capture::{CapturePipeline, CaptureService};
use crate::config::RelayConfig;
use crate::dispatch::DispatchManager;
use crate::notification::{EventSink, Invocation, JournalWriter};
use crate::platform::{AppInventory, InstalledApp, PlatformBindings, PlatformEvent};

/// 中继核心
pub struct Relay {
    pipeline: Arc<CapturePipeline>,
    capture: CaptureService,
    dispatch: DispatchManager,
    inventory: Arc<dyn AppInventory>,
    sink: Arc<dyn EventSink>,
    journal: Option<JournalWriter>,
}

impl Relay {
    pub fn new(config: &RelayConfig, platform: PlatformBindings, sink: Arc<dyn EventSink>) -> Result<Self> {
        let journal = config.journal.open().map(JournalWriter::spawn).transpose()?;
        Self::with_journal(config, platform, sink, journal)
    }

    pub fn with_journal(
        config: &RelayConfig,
        platform: PlatformBindings,
        sink: Arc<dyn EventSink>,
        journal: Option<JournalWriter>,
    ) -> Result<Self> {
        let pipeline = Arc::new(
            CapturePipeline::new(config.package_filter()?, platform.resolver, sink.clone())
                .with_journal(journal.clone()),
        );
        let capture = CaptureService::new(platform.host, pipeline.clone());
        let dispatch = DispatchManager::new(platform.surface)
            .with_policy(config.identity_policy)
            .with_channel(config.dispatch_channel.clone())
            .with_defaults(config.defaults)
            .with_journal(journal.clone());

        Ok(Self {
            pipeline,
            capture,
            dispatch,
            inventory: platform.inventory,
            sink,
            journal,
        })
    }

    pub fn capture(&self) -> &CaptureService {
        &self.capture
    }

    pub fn dispatch(&self) -> &DispatchManager {
        &self.dispatch
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    /// 等待诊断日志写完，未开启时直接返回
    pub fn flush_journal(&self) {
        if let Some(journal) = &self.journal {
            journal.flush();
        }
    }

    /// 已安装应用清单，失败时返回空列表
    pub fn installed_apps(&self) -> Vec<InstalledApp> {
        match self.inventory.list_installed() {
            Ok(apps) => apps,
            Err(e) => {
                warn!(error = %e, "Failed to list installed apps");
                Vec::new()
            }
        }
    }

    /// 处理一个平台事件
    pub fn handle_platform_event(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::Posted(raw) => {
                self.pipeline.on_posted(&raw);
            }
            PlatformEvent::Removed(raw) => self.pipeline.on_removed(&raw),
            PlatformEvent::ListenerConnected => {
                self.pipeline.on_listener_connected();
            }
            PlatformEvent::ListenerDisconnected => {
                self.pipeline.on_listener_disconnected();
            }
            PlatformEvent::Dismissed { logical_id } => self.dispatch.on_user_dismissed(&logical_id),
            PlatformEvent::DismissedSlot { platform_id } => {
                self.dispatch.on_platform_removed(platform_id);
            }
            PlatformEvent::Tapped(payload) => {
                self.dispatch.on_tapped(&payload.logical_id);
                if let Err(e) = self.sink.invoke(Invocation::NotificationTapped(payload)) {
                    warn!(error = %e, "Event channel unavailable, tap dropped");
                }
            }
        }
    }

    /// 消费平台事件队列直到所有发送端关闭
    pub async fn run_platform_loop(self: Arc<Self>, mut events: UnboundedReceiver<PlatformEvent>) {
        debug!("Platform event loop started");
        while let Some(event) = events.recv().await {
            self.handle_platform_event(event);
        }
        debug!("Platform event loop finished");
    }

    /// 按固定间隔清空抑制账本
    pub async fn run_ledger_maintenance(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        // 第一次 tick 立即完成，跳过
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let cleared = self.dispatch.clear_suppression_ledger();
            debug!(cleared, "Periodic suppression ledger clear");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{ChannelLink, DispatchRequest, RawNotification};
    use crate::platform::MemoryPlatform;
    use tokio::sync::mpsc;

    fn relay() -> (Arc<MemoryPlatform>, Arc<Relay>, mpsc::UnboundedReceiver<Invocation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let platform = Arc::new(MemoryPlatform::new().with_permission(true));
        let relay = Relay::new(
            &RelayConfig::default(),
            PlatformBindings::memory(platform.clone()),
            Arc::new(ChannelLink::new(tx)),
        )
        .unwrap();
        (platform, Arc::new(relay), rx)
    }

    #[test]
    fn test_posted_event_is_forwarded() {
        let (_platform, relay, mut rx) = relay();

        relay.handle_platform_event(PlatformEvent::Posted(
            RawNotification::new("com.thirdparty.chat", 7).with_title("Hi"),
        ));

        assert!(matches!(rx.try_recv().unwrap(), Invocation::NotificationCaptured(_)));
    }

    #[test]
    fn test_dismissed_slot_suppresses_owned_id() {
        let (platform, relay, _rx) = relay();
        relay.dispatch().show(&DispatchRequest::new("A").with_title("t"));
        let platform_id = relay.dispatch().platform_id("A");

        let event = platform.dismiss(platform_id).unwrap();
        assert_eq!(event, PlatformEvent::Dismissed { logical_id: "A".to_string() });
        relay.handle_platform_event(PlatformEvent::DismissedSlot { platform_id });

        assert!(relay.dispatch().is_suppressed("A"));
    }

    #[test]
    fn test_tap_is_forwarded() {
        let (platform, relay, mut rx) = relay();
        relay.dispatch().show(&DispatchRequest::new("A").with_title("t"));

        let event = platform.tap(relay.dispatch().platform_id("A")).unwrap();
        relay.handle_platform_event(event);

        match rx.try_recv().unwrap() {
            Invocation::NotificationTapped(payload) => assert_eq!(payload.logical_id, "A"),
            other => panic!("unexpected invocation: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_platform_loop_drains_queue() {
        let (_platform, relay, mut rx) = relay();
        let (tx, events) = mpsc::unbounded_channel();

        tx.send(PlatformEvent::ListenerConnected).unwrap();
        tx.send(PlatformEvent::ListenerConnected).unwrap();
        drop(tx);
        relay.clone().run_platform_loop(events).await;

        assert!(relay.capture().is_active());
        assert_eq!(rx.try_recv().unwrap(), Invocation::CaptureConnected);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ledger_maintenance_clears_periodically() {
        let (_platform, relay, _rx) = relay();
        relay.dispatch().on_user_dismissed("A");

        let task = tokio::spawn(relay.clone().run_ledger_maintenance(Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!relay.dispatch().is_suppressed("A"));
        task.abort();
    }
}
