//! OPD排队服务器主程序

mod config;

use crate::config::OpdConfig;
use anyhow::Context;
use clap::Parser;
use opd_store::{MemoryPatientStore, PatientStore};
use opd_web::{AppState, SessionManager, WebServer};
use opd_workflow::{MutationGateway, QueueProjection, RegistrationService};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// OPD排队服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "opd-server")]
#[command(about = "门诊排队管理系统 (OPD Queue Manager) 服务器")]
struct Args {
    /// 监听主机，优先于配置文件
    #[arg(long)]
    host: Option<String>,

    /// 监听端口，优先于配置文件
    #[arg(short, long)]
    port: Option<u16>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    info!("启动OPD排队服务器...");

    let mut config = OpdConfig::load(args.config.as_deref()).context("failed to load config")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;

    info!("OPD服务器配置:");
    info!("  监听地址: {}", addr);

    // 存储与核心服务装配
    let store: Arc<dyn PatientStore> = Arc::new(MemoryPatientStore::new());
    let state = AppState {
        registration: Arc::new(RegistrationService::new(store.clone())),
        gateway: Arc::new(MutationGateway::new(store.clone())),
        projection: Arc::new(QueueProjection::new(store)),
        sessions: SessionManager::new(config.auth.clone()),
    };

    WebServer::new(addr, state).run().await?;

    Ok(())
}
