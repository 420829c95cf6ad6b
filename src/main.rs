use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use ara_push_service::config::Settings;
use ara_push_service::infrastructure::{CircuitBreaker, PostgresPool, RedisPool};
use ara_push_service::notification::{DispatchPolicy, PushDispatcher};
use ara_push_service::push::{VapidCredentials, WebPushTransport};
use ara_push_service::server::{create_app, AppState};
use ara_push_service::subscription::{create_subscription_store, PostgresSubscriptionStore};
use ara_push_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    if std::env::args().any(|arg| arg == "--generate-vapid-keys") {
        print_vapid_keys(&settings.vapid.subject);
        return Ok(());
    }

    // Initialize tracing
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    // VAPID keys are required before anything is served
    let credentials = Arc::new(
        VapidCredentials::from_config(&settings.vapid)
            .context("Invalid VAPID configuration, run with --generate-vapid-keys to create a pair")?,
    );
    tracing::info!(
        subject = %credentials.subject(),
        public_key = %credentials.public_key_base64url(),
        "VAPID credentials loaded"
    );

    // Persistent store backends
    let circuit_breaker = Arc::new(CircuitBreaker::new());
    let mut postgres_pool = None;
    let mut redis_pool = None;

    match settings.store.backend.as_str() {
        "postgres" => {
            let database = settings
                .database
                .as_ref()
                .context("store.backend = postgres requires database.url")?;
            let pool = Arc::new(PostgresPool::new(database, circuit_breaker.clone()).await?);

            if settings.store.migrate {
                PostgresSubscriptionStore::new(pool.clone())
                    .ensure_schema()
                    .await
                    .context("Failed to prepare push_subscriptions table")?;
            }
            postgres_pool = Some(pool);
        }
        "redis" => {
            let pool = RedisPool::new(&settings.redis, circuit_breaker.clone()).await?;
            redis_pool = Some(Arc::new(pool));
        }
        _ => {}
    }
    let persistent = postgres_pool.is_some() || redis_pool.is_some();

    let store = create_subscription_store(&settings.store, postgres_pool.clone(), redis_pool);

    // Dispatcher
    let transport = WebPushTransport::new(credentials, &settings.dispatch)?;
    let policy = DispatchPolicy::from(&settings.dispatch);
    tracing::info!(
        max_concurrency = policy.max_concurrency,
        deadline_ms = ?settings.dispatch.deadline_ms,
        prune_status_codes = ?policy.prune_status_codes,
        "Dispatcher initialized"
    );
    let dispatcher = Arc::new(PushDispatcher::with_policy(store, Arc::new(transport), policy));

    // Create application state
    let mut state = AppState::new(settings.clone(), dispatcher);
    if persistent {
        state = state.with_circuit_breaker(circuit_breaker);
    }

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler())
        .await?;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn print_vapid_keys(subject: &str) {
    let credentials = VapidCredentials::generate(subject);
    println!("VAPID_PUBLIC={}", credentials.public_key_base64url());
    println!("VAPID_PRIVATE={}", credentials.private_key_base64url());
    println!("VAPID_SUBJECT={}", credentials.subject());
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
