//! Notify Relay CLI
//!
//! 在 stdio 上运行通知中继，并提供诊断日志、哈希和配置查看命令

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use notify_relay::{
    cli::{format_history, format_output, handle_serve, ServeArgs},
    stable_hash, Journal, RelayConfig,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "nrelay")]
#[command(about = "Notify Relay - 捕获并转发系统通知，按指令在本机重现通知")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 在 stdio 上运行事件通道
    Serve(ServeArgs),
    /// 查看诊断日志
    History {
        /// 配置文件路径
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// 显示条数
        #[arg(long, short, default_value = "20")]
        limit: usize,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 计算 logical id 对应的 platform id
    Hash {
        /// logical id
        logical_id: String,
    },
    /// 打印生效的配置
    Config {
        /// 配置文件路径
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout 留给协议，日志只写 stderr
    // 例如: RUST_LOG=debug nrelay serve
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notify_relay=info,nrelay=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            handle_serve(args).await?;
        }
        Commands::History { config, limit, json } => {
            let config = RelayConfig::load(config.as_deref())?;
            let journal = Journal::new(config.journal.resolved_path(), config.journal.max_records);
            let records = journal.read_recent(limit);
            println!("{}", format_history(&records, json));
        }
        Commands::Hash { logical_id } => {
            println!("{}", stable_hash(&logical_id));
        }
        Commands::Config { config } => {
            let config = RelayConfig::load(config.as_deref())?;
            println!("{}", format_output(&config));
        }
    }

    Ok(())
}
