//! Demo server: in-memory article store with three views, REST surface from config
//! (`COUCH_MODEL_CONFIG`, or a built-in default), mounted at the configured prefix.

use couch_model::{load_from_env, load_from_str, MemoryStore, Model, ModelConfig};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = r#"{
    "views": [
        "_design/article/_view/by_date",
        { "path": "_design/article/_view/by_tag", "name": "by_one_of_the_tags" },
        { "path": "_design/article/_view/by_slug" }
    ],
    "restapi": {
        "prefix": "/articles",
        "index": true,
        "byID": true,
        "views": { "bySlug": true, "byOneOfTheTags": false }
    }
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("couch_model=info".parse()?))
        .init();

    let mut config = load_from_env().await?;
    if config == ModelConfig::default() {
        config = load_from_str(DEFAULT_CONFIG)?;
    }

    let store = Arc::new(MemoryStore::new());
    define_article_views(&store).await;
    let model = Model::new(store, &config)?;
    seed(&model).await?;

    let Some(app) = model.router() else {
        tracing::warn!("config has no restapi section; nothing to serve");
        return Ok(());
    };

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn define_article_views(store: &MemoryStore) {
    store
        .define_view("_design/article/_view/by_date", |doc| {
            vec![(doc.get("date").cloned().unwrap_or(Value::Null), doc.clone())]
        })
        .await;
    store
        .define_view("_design/article/_view/by_tag", |doc| {
            doc.get("tags")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().map(|t| (t.clone(), doc.clone())).collect())
                .unwrap_or_default()
        })
        .await;
    store
        .define_view("_design/article/_view/by_slug", |doc| {
            vec![(doc.get("slug").cloned().unwrap_or(Value::Null), doc.clone())]
        })
        .await;
}

async fn seed(model: &Model) -> Result<(), couch_model::AppError> {
    let articles = [
        json!({ "_id": "1", "date": "2013-03-24T05:22:31", "slug": "hello-world", "tags": ["intro"] }),
        json!({ "_id": "2", "date": "2014-03-24T05:00:00", "slug": "second-post", "tags": ["intro", "news"] }),
    ];
    for article in articles {
        let fields: Map<String, Value> = article.as_object().cloned().unwrap_or_default();
        let mut entity = model.create(fields);
        model.save(&mut entity).await?;
    }
    Ok(())
}
