use identity_service::{
    build_router,
    config::{IdentityConfig, NotificationProvider},
    db,
    services::{
        metrics, AuthService, Database, LinkBuilder, NotificationGateway, ResendGateway, SessionTokenCodec,
        SmtpGateway,
    },
    AppState,
};
use service_core::error::AppError;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = IdentityConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level, config.otlp_endpoint.as_deref());
    metrics::init_metrics().map_err(AppError::InternalError)?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting identity service"
    );

    let store_timeout = Duration::from_secs(config.store_timeout_seconds);
    let pool = db::create_pool(&config.database, store_timeout)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect to database: {}", e)))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to run migrations: {}", e)))?;
    let database = Arc::new(Database::new(pool));

    let notifier = build_notifier(&config)?;
    tracing::info!(provider = ?config.notification.provider, "Notification gateway initialized");

    let auth_service = AuthService::new(
        database.clone(),
        database,
        notifier,
        SessionTokenCodec::new(&config.jwt.secret),
        LinkBuilder::new(&config.frontend_url),
        config.auth_timeouts(),
    );

    match auth_service.purge_expired_tokens().await {
        Ok(purged) => tracing::info!(purged, "Purged expired ephemeral tokens"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge expired ephemeral tokens"),
    }

    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let register_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.register_attempts,
        config.rate_limit.register_window_seconds,
    );
    let password_reset_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.password_reset_attempts,
        config.rate_limit.password_reset_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );
    tracing::info!("Rate limiters initialized: Login, Register, Password Reset and Global IP");

    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        auth_service,
        login_rate_limiter,
        register_rate_limiter,
        password_reset_rate_limiter,
        ip_rate_limiter,
    };
    let app = build_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(Duration::from_secs(
            config.common.shutdown_grace_seconds,
        )))
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

fn build_notifier(config: &IdentityConfig) -> Result<Arc<dyn NotificationGateway>, AppError> {
    let notification = &config.notification;
    let timeout = Duration::from_secs(notification.timeout_seconds);
    let missing = |section: &str| AppError::ConfigError(anyhow::anyhow!("{} settings are missing", section));

    let gateway: Arc<dyn NotificationGateway> = match notification.provider {
        NotificationProvider::Smtp => {
            let smtp = notification.smtp.as_ref().ok_or_else(|| missing("SMTP"))?;
            Arc::new(
                SmtpGateway::new(smtp, &notification.from, timeout)
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
            )
        }
        NotificationProvider::Resend => {
            let resend = notification.resend.as_ref().ok_or_else(|| missing("Resend"))?;
            Arc::new(
                ResendGateway::new(resend, &notification.from, timeout)
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
            )
        }
    };

    Ok(gateway)
}

async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    // In-flight requests get the grace period to complete
    tokio::time::sleep(grace).await;
}
