use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use category_tree::api::{CategoryTreeApp, HasCategorySource};
use category_tree::prelude::{CategoryId, MAX_DEPTH_LIMIT, NewCategory, PgCategorySource};
use serde_json::json;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Clone)]
struct DemoApp {
    source: Arc<PgCategorySource>,
    max_depth_limit: u32,
}

impl HasCategorySource for DemoApp {
    type Source = PgCategorySource;

    fn category_source(&self) -> Arc<PgCategorySource> {
        Arc::clone(&self.source)
    }
}

impl CategoryTreeApp for DemoApp {
    fn max_depth_limit(&self) -> u32 {
        self.max_depth_limit
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = env::var("DATABASE_URL")
        .context("DATABASE_URL is required to run demos/category_api_server.rs")?;
    let bind = env::var("CATEGORY_TREE_BIND").unwrap_or_else(|_| "127.0.0.1:4020".to_string());
    let bind_addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid CATEGORY_TREE_BIND '{}'", bind))?;
    let max_connections = match env::var("CATEGORY_TREE_MAX_CONNECTIONS") {
        Ok(value) => value
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid CATEGORY_TREE_MAX_CONNECTIONS '{}'", value))?,
        Err(_) => 5,
    };
    let max_depth_limit = match env::var("CATEGORY_TREE_MAX_DEPTH_LIMIT") {
        Ok(value) => value
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid CATEGORY_TREE_MAX_DEPTH_LIMIT '{}'", value))?,
        Err(_) => MAX_DEPTH_LIMIT,
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to postgres")?;

    category_tree::db::create_category_tables(&pool)
        .await
        .context("failed to run category migrations")?;

    if env_flag("CATEGORY_TREE_SEED_DEMO") {
        seed_demo_catalog(&pool).await?;
    }

    let app_state = DemoApp {
        source: Arc::new(PgCategorySource::new(Arc::new(pool))),
        max_depth_limit,
    };

    let api_v1 = Router::new()
        .route("/healthz", get(health_handler))
        .merge(category_tree::api::routes::<DemoApp>());

    let app = Router::new().nest("/api/v1", api_v1).with_state(app_state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", bind_addr))?;

    tracing::info!(%bind_addr, "category tree demo server listening under /api/v1");

    axum::serve(listener, app)
        .await
        .context("demo server failed")
}

fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            normalized == "1" || normalized == "true" || normalized == "yes"
        }
        Err(_) => false,
    }
}

const DEMO_ROOT: CategoryId = CategoryId(1);

async fn seed_demo_catalog(pool: &PgPool) -> anyhow::Result<()> {
    if category_tree::db::category_exists(pool, DEMO_ROOT)
        .await
        .context("failed to check for demo catalog")?
    {
        tracing::info!(root_id = %DEMO_ROOT, "demo catalog already seeded");
        return Ok(());
    }

    let apparel = category_tree::db::create_department(pool, "Apparel")
        .await
        .context("failed to create demo department")?;
    let outdoor = category_tree::db::create_department(pool, "Outdoor")
        .await
        .context("failed to create demo department")?;

    let categories = [
        (1, None, Some(apparel), "Catalog"),
        (2, Some(1), None, "Shoes"),
        (3, Some(2), Some(outdoor), "Sneakers"),
        (4, Some(2), None, "Boots"),
        (5, Some(1), Some(outdoor), "Hats"),
    ];

    for (id, parent_id, department_id, name) in categories {
        let category = NewCategory {
            id: CategoryId(id),
            parent_id: parent_id.map(CategoryId),
            department_id,
            name: name.to_string(),
        };
        if let Err(err) = category_tree::db::create_category(pool, category).await {
            tracing::warn!(category_id = id, error = %err, "skipping demo category");
        }
    }

    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true
    }))
}
