use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use localizer::{
    application::{
        components::ComponentService, error::AppError, generator::ComponentGenerator,
    },
    cache::{CacheConfig, CacheCoordinator, OriginGenerator, SecondaryStore},
    config,
    domain::entities::LocalizedComponent,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        redis::RedisSecondaryStore,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let components = Arc::new(build_component_service(&settings).await);

    info!(
        target = "localizer::serve",
        components = %components.available_components().join(", "),
        languages = %components.available_languages().join(", "),
        "component catalogue loaded"
    );

    serve_http(&settings, HttpState { components }).await
}

async fn build_component_service(settings: &config::Settings) -> ComponentService {
    let cache_config = CacheConfig::from(&settings.cache);
    let generator: Arc<dyn OriginGenerator<LocalizedComponent>> =
        Arc::new(ComponentGenerator::new());
    let mut coordinator = CacheCoordinator::new(cache_config, generator);

    if let Some(secondary) = connect_secondary(&settings.secondary).await {
        coordinator = coordinator.with_secondary(secondary);
    }

    info!(
        target = "localizer::serve",
        primary_capacity = coordinator.primary().capacity(),
        primary_ttl_secs = coordinator.primary().ttl().as_secs(),
        compute_concurrency = coordinator.gate().capacity(),
        secondary = coordinator.has_secondary(),
        "cache coordinator ready"
    );

    ComponentService::new(Arc::new(coordinator))
}

/// Connect to Redis when enabled. A failed connection leaves the service
/// running on the primary tier alone.
async fn connect_secondary(
    settings: &config::SecondarySettings,
) -> Option<Arc<dyn SecondaryStore<LocalizedComponent>>> {
    if !settings.enabled {
        info!(target = "localizer::serve", "secondary store disabled");
        return None;
    }

    match RedisSecondaryStore::<LocalizedComponent>::connect(settings).await {
        Ok(store) => {
            let store: Arc<dyn SecondaryStore<LocalizedComponent>> = Arc::new(store);
            Some(store)
        }
        Err(err) => {
            warn!(
                target = "localizer::serve",
                error = %err,
                "redis connection failed; continuing without secondary store"
            );
            None
        }
    }
}

async fn serve_http(settings: &config::Settings, http_state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(http_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "localizer::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let graceful_shutdown = settings.server.graceful_shutdown;
    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();

    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = drain_tx.send(());
        },
    );

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(drain_rx, graceful_shutdown) => {
            warn!(
                target = "localizer::serve",
                timeout_secs = graceful_shutdown.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "localizer::serve", "server stopped");
    Ok(())
}

/// Resolves once shutdown has started and the drain period has elapsed.
async fn drain_deadline(started: tokio::sync::oneshot::Receiver<()>, timeout: Duration) {
    if started.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(timeout).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "localizer::serve", "shutdown signal received");
}
