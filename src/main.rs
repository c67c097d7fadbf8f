use std::{process, sync::Arc};

use tagfeed::{
    application::{
        error::AppError,
        query::{PostsQuery, QueryService},
    },
    cache::{CacheConfig, TagCache},
    config::{self, Command, QueryArgs},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        upstream::HttpPostSource,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) =
        config::load_with_cli().map_err(|err| InfraError::configuration(err.to_string()))?;

    let command = cli_args
        .command
        .unwrap_or(Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;
    let query = build_query_service(&settings)?;

    match command {
        Command::Serve(_) => run_serve(&settings, query).await,
        Command::Query(args) => run_query(&query, args).await,
    }
}

fn build_query_service(settings: &config::Settings) -> Result<Arc<QueryService>, AppError> {
    let cache = Arc::new(TagCache::new(CacheConfig::from(&settings.cache)));
    let source = Arc::new(HttpPostSource::new(&settings.upstream)?);
    Ok(Arc::new(QueryService::new(cache, source)))
}

async fn run_serve(settings: &config::Settings, query: Arc<QueryService>) -> Result<(), AppError> {
    let router = http::build_router(HttpState { query });

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        addr = %settings.server.addr,
        upstream = %settings.upstream.endpoint,
        single_flight = settings.cache.single_flight,
        "tagfeed listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn run_query(query: &QueryService, args: QueryArgs) -> Result<(), AppError> {
    let parsed = PostsQuery::parse(
        Some(args.tags.as_str()),
        Some(args.sort_by.as_str()),
        Some(args.direction.as_str()),
    )?;
    let posts = query.run(&parsed).await?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&posts)
    } else {
        serde_json::to_string(&posts)
    }
    .map_err(|err| AppError::unexpected(format!("failed to encode posts: {err}")))?;

    println!("{rendered}");
    Ok(())
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
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
    info!("shutdown signal received");
}
