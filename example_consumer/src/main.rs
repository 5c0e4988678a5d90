//! Example consumer: a separate Rust project that nests a couch-model REST surface
//! next to its own routes.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use axum::{routing::get, Json, Router};
use couch_model::{load_from_env, MemoryStore, Model};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("couch_model=info")),
        )
        .init();

    let config = load_from_env().await?;
    let model = Model::new(Arc::new(MemoryStore::new()), &config)?;

    let mut app = Router::new().route("/version", get(version));
    if let Some(rest) = model.router() {
        // The model matches its own prefix, so it takes every path the app does not.
        app = app.fallback_service(rest);
    }

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
