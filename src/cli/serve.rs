//! Serve 命令 - 在 stdio 上运行事件通道

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::bridge::BridgeServer;
use crate::config::RelayConfig;
use crate::notification::ChannelLink;
use crate::platform::{DesktopEntryResolver, MemoryPlatform, PlatformBindings};
use crate::relay::Relay;

/// Serve 命令参数
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// 配置文件路径（默认 ~/.config/notify-relay/config.json）
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// 使用本机桌面：.desktop 应用名和应用清单，启用 desktop feature 时在桌面上显示通知
    #[arg(long)]
    pub desktop: bool,
}

/// 构建平台实现
///
/// 默认全部使用内存平台，监听会话的连接/断开由宿主通过 platform/* 方法上报。
fn platform_bindings(desktop: bool) -> PlatformBindings {
    let memory = Arc::new(MemoryPlatform::new().with_permission(true));
    let mut bindings = PlatformBindings::memory(memory);
    if !desktop {
        return bindings;
    }

    let resolver = Arc::new(DesktopEntryResolver::new());
    bindings.resolver = resolver.clone();
    bindings.inventory = resolver;

    #[cfg(all(feature = "desktop", target_os = "linux"))]
    {
        bindings.surface = Arc::new(crate::platform::desktop::DesktopSurface::new(env!("CARGO_PKG_NAME")));
    }
    #[cfg(not(all(feature = "desktop", target_os = "linux")))]
    warn!("Built without desktop surface support, dispatched notifications stay in memory");

    bindings
}

/// 处理 serve 命令，stdin 关闭时返回
pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    let config = RelayConfig::load(args.config.as_deref())?;

    let (invocation_tx, invocation_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let relay = Arc::new(Relay::new(
        &config,
        platform_bindings(args.desktop),
        Arc::new(ChannelLink::new(invocation_tx)),
    )?);
    info!(
        policy = ?config.identity_policy,
        desktop = args.desktop,
        journal = config.journal.enabled,
        "Relay configured"
    );

    let platform_loop = tokio::spawn(relay.clone().run_platform_loop(event_rx));
    let maintenance = match config.ledger_clear_interval_secs {
        0 => None,
        secs => Some(tokio::spawn(
            relay.clone().run_ledger_maintenance(Duration::from_secs(secs)),
        )),
    };

    let server = BridgeServer::new(relay.clone(), event_tx);
    let result = server.run(invocation_rx).await;

    platform_loop.abort();
    if let Some(maintenance) = maintenance {
        maintenance.abort();
    }
    // 退出前把排队的诊断记录写完
    if let Err(e) = tokio::task::spawn_blocking(move || relay.flush_journal()).await {
        warn!(error = %e, "Journal flush task failed");
    }
    result
}
