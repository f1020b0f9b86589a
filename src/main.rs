mod config;
mod error;
mod evaluation;
mod models;
mod observer;
mod repository;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::Config::from_env();

    let observer: Arc<dyn observer::FlagObserver> = Arc::new(observer::TracingObserver);
    let flags = Arc::new(repository::FlagRepository::with_observer(observer.clone()));

    let state = state::AppState { flags, observer };

    let app = routes::routes().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr()).await.unwrap();

    tracing::info!("server is chilling at http://{}", config.addr());

    axum::serve(listener, app).await.unwrap();
}
