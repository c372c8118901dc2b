//! 服务器生命周期：初始化上下文、启动 HTTP 服务与后台任务、优雅退出

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::context::AppContext;
use crate::error::{Result, ServerError};
use crate::http::{ApiHttpServer, HttpServerState};

pub struct ApiServer {
    ctx: AppContext,
}

impl ApiServer {
    /// 连接数据库、缓存等外部资源
    pub async fn new(config: ServerConfig) -> Result<Self> {
        info!("🔧 初始化服务器组件...");
        let ctx = AppContext::init(config).await?;
        info!("✅ 服务器组件初始化完成");
        Ok(Self { ctx })
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// 运行直到收到 Ctrl-C / SIGTERM
    pub async fn run(self) -> Result<()> {
        let (stop_tx, stop_rx) = watch::channel(false);

        let cleaner = self.start_session_cleaner(stop_rx);

        let bind_address = self.ctx.config.bind_address();
        let http_server = ApiHttpServer::new(HttpServerState::from(&self.ctx), bind_address);
        let served = http_server.serve(shutdown_signal()).await;

        info!("🛑 HTTP 服务已停止，正在清理...");
        let _ = stop_tx.send(true);
        if let Err(e) = cleaner.await {
            warn!("⚠️ 会话清理任务退出异常: {}", e);
        }
        self.ctx.shutdown().await;
        info!("👋 服务器已退出");

        served.map_err(|e| ServerError::Internal(format!("HTTP 服务运行失败: {}", e)))
    }

    /// 启动过期会话清理任务
    fn start_session_cleaner(&self, mut stop_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let auth_service = self.ctx.auth_service.clone();
        let period = Duration::from_secs(self.ctx.config.auth.session_cleanup_interval_secs.max(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match auth_service.purge_expired_sessions().await {
                            Ok(0) => {}
                            Ok(n) => info!("🧹 清理过期会话: {} 个", n),
                            Err(e) => error!("❌ 清理过期会话失败: {}", e),
                        }
                    }
                    _ = stop_rx.changed() => break,
                }
            }
        });
        info!("✅ 会话清理任务已启动（间隔 {}s）", period.as_secs());
        handle
    }
}

/// 等待 Ctrl-C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ 无法监听 Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("❌ 无法监听 SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("📥 收到 Ctrl-C，开始优雅退出"),
        _ = terminate => info!("📥 收到 SIGTERM，开始优雅退出"),
    }
}
