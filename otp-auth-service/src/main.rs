use otp_auth_service::{
    bootstrap_user, build_router,
    config::AuthConfig,
    db,
    services::{start_otp_sweeper, AuthService, Database, SmtpOtpNotifier, TokenCodec, UserService},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting OTP authentication service"
    );

    let pool = db::create_pool(&config.database)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
    let database = Database::new(pool);
    let store = Arc::new(database.clone());

    let notifier = Arc::new(SmtpOtpNotifier::new(&config.smtp).map_err(AppError::ConfigError)?);
    let codec = TokenCodec::new(&config.jwt).map_err(AppError::ConfigError)?;

    let auth = AuthService::new(store.clone(), store.clone(), notifier, codec, &config.otp);
    let users = UserService::new(store);

    if let Some(bootstrap) = &config.bootstrap {
        bootstrap_user(&users, bootstrap).await.map_err(AppError::from)?;
    }

    // Held for the life of the process; dropping it stops the sweep.
    let _sweeper = start_otp_sweeper(auth.clone(), &config.otp.sweep_cron)
        .await
        .map_err(AppError::ConfigError)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let state = AppState {
        config: Arc::new(config),
        db: Some(database),
        auth,
        users,
    };
    let app = build_router(state);

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
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
}
