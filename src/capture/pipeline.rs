//! 捕获管线 - 把平台的通知回调变成转发给编排端的事件
//!
//! 每次 posted 回调最多转发一个事件；保留来源直接丢弃。
//! 通道不可用时事件只在本地记录后丢弃，没有重试也没有队列。

use std::sync::Arc;

use tracing::{debug, warn};

use super::connection::ConnectionState;
use super::filter::PackageFilter;
use super::label::{resolve_label_or_package, AppLabelResolver};
use crate::notification::store::{JournalKind, JournalRecord, JournalWriter};
use crate::notification::{CapturedEvent, ChannelError, EventSink, Invocation, RawNotification};

/// 一次 posted 回调的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardOutcome {
    /// 已投递到通道
    Forwarded(CapturedEvent),
    /// 来源在保留集合内，未构造事件
    Filtered,
    /// 已构造事件但通道不可用，事件丢弃
    Dropped(ChannelError),
}

/// 捕获管线
pub struct CapturePipeline {
    filter: PackageFilter,
    resolver: Arc<dyn AppLabelResolver>,
    sink: Arc<dyn EventSink>,
    connection: ConnectionState,
    journal: Option<JournalWriter>,
}

impl CapturePipeline {
    pub fn new(
        filter: PackageFilter,
        resolver: Arc<dyn AppLabelResolver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            filter,
            resolver,
            sink,
            connection: ConnectionState::new(),
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Option<JournalWriter>) -> Self {
        self.journal = journal;
        self
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn filter(&self) -> &PackageFilter {
        &self.filter
    }

    fn record(&self, record: JournalRecord) {
        if let Some(journal) = &self.journal {
            journal.record(record);
        }
    }

    /// 处理 posted 回调
    pub fn on_posted(&self, raw: &RawNotification) -> ForwardOutcome {
        let package = raw.package_name.as_str();
        if self.filter.is_excluded(package) {
            debug!(package = %package, "Ignoring notification from excluded package");
            return ForwardOutcome::Filtered;
        }

        let app_name = resolve_label_or_package(self.resolver.as_ref(), package);
        let event = CapturedEvent::from_raw(raw, app_name);

        debug!(
            logical_id = %event.logical_id(),
            package = %package,
            app = %event.source_app_name(),
            "Notification captured"
        );
        self.record(
            JournalRecord::new(JournalKind::Captured)
                .logical_id(event.logical_id())
                .package(package)
                .summary(event.title().unwrap_or_default()),
        );

        match self.sink.invoke(Invocation::NotificationCaptured(event.clone())) {
            Ok(()) => ForwardOutcome::Forwarded(event),
            Err(e) => {
                warn!(logical_id = %event.logical_id(), error = %e, "Event channel unavailable, captured notification dropped");
                ForwardOutcome::Dropped(e)
            }
        }
    }

    /// 处理 removed 回调，只做诊断记录
    pub fn on_removed(&self, raw: &RawNotification) {
        debug!(package = %raw.package_name, post_time = raw.post_time, "Notification removed");
        self.record(
            JournalRecord::new(JournalKind::Removed)
                .logical_id(raw.post_time.to_string())
                .package(raw.package_name.as_str()),
        );
    }

    /// 平台授予监听会话
    pub fn on_listener_connected(&self) -> bool {
        self.connection.mark_connected(self.sink.as_ref())
    }

    /// 监听会话丢失或主动结束
    pub fn on_listener_disconnected(&self) -> bool {
        self.connection.mark_disconnected(self.sink.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::ChannelLink;
    use crate::platform::MemoryPlatform;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn pipeline() -> (CapturePipeline, UnboundedReceiver<Invocation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let platform = Arc::new(MemoryPlatform::new());
        platform.add_label("com.thirdparty.chat", "Chat");
        let pipeline = CapturePipeline::new(
            PackageFilter::new("com.notifyrelay.app"),
            platform,
            Arc::new(ChannelLink::new(tx)),
        );
        (pipeline, rx)
    }

    #[test]
    fn test_reserved_packages_forward_nothing() {
        let (pipeline, mut rx) = pipeline();

        for package in ["com.notifyrelay.app", "android", "com.android.systemui", "com.android.settings"] {
            let raw = RawNotification::new(package, 1000).with_title("x");
            assert_eq!(pipeline.on_posted(&raw), ForwardOutcome::Filtered);
        }

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_forwards_normalized_event() {
        let (pipeline, mut rx) = pipeline();
        let raw = RawNotification::new("com.thirdparty.chat", 1000)
            .with_title("Hi")
            .with_text("there");

        let outcome = pipeline.on_posted(&raw);

        match rx.try_recv().unwrap() {
            Invocation::NotificationCaptured(event) => {
                assert_eq!(event.logical_id(), "1000");
                assert_eq!(event.source_package(), "com.thirdparty.chat");
                assert_eq!(event.source_app_name(), "Chat");
                assert_eq!(event.title(), Some("Hi"));
                assert_eq!(event.body(), Some("there"));
                assert_eq!(outcome, ForwardOutcome::Forwarded(event));
            }
            other => panic!("unexpected invocation: {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unknown_label_falls_back_to_package() {
        let (pipeline, mut rx) = pipeline();

        pipeline.on_posted(&RawNotification::new("com.other.app", 5));

        match rx.try_recv().unwrap() {
            Invocation::NotificationCaptured(event) => {
                assert_eq!(event.source_app_name(), "com.other.app");
                assert!(event.title().is_none());
            }
            other => panic!("unexpected invocation: {:?}", other),
        }
    }

    #[test]
    fn test_channel_closed_drops_event() {
        let (pipeline, rx) = pipeline();
        drop(rx);

        let outcome = pipeline.on_posted(&RawNotification::new("com.thirdparty.chat", 1));
        assert_eq!(outcome, ForwardOutcome::Dropped(ChannelError::Closed));
    }

    #[test]
    fn test_removed_forwards_nothing() {
        let (pipeline, mut rx) = pipeline();

        pipeline.on_removed(&RawNotification::new("com.thirdparty.chat", 1));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_listener_transitions() {
        let (pipeline, mut rx) = pipeline();

        assert!(pipeline.on_listener_connected());
        assert!(pipeline.connection().is_active());
        assert!(pipeline.on_listener_disconnected());
        assert!(!pipeline.on_listener_disconnected());

        assert_eq!(rx.try_recv().unwrap(), Invocation::CaptureConnected);
        assert_eq!(rx.try_recv().unwrap(), Invocation::CaptureDisconnected);
        assert!(rx.try_recv().is_err());
    }
}
