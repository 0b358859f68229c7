//! Example consumer: compiles a config directory and prints what a UI layer would render.
//!
//! Run from repo root: `AUIX_CONFIG_DIR=tests/fixtures/shop cargo run -p example-consumer`
//! With `DATABASE_URL` set, each resource with a `table` opt also has its index query run.

use auix::config::config_dir;
use auix::sql::SelectQuery;
use auix::{compile, load_from_dir, translate_for, Backends, DeclarativeActionAdapter, SimpleSchemaAdapter, ViewKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("auix=info")),
        )
        .init();

    let dir = config_dir();
    let loaded = load_from_dir(&dir)?;
    let mut backends = Backends::new();
    if let Some(schemas) = loaded.schemas {
        backends = backends.with_simple(SimpleSchemaAdapter::new(schemas));
    }
    if let Some(actions) = loaded.actions {
        backends = backends.with_declarative(DeclarativeActionAdapter::new(actions));
    }
    let app = compile(&loaded.app, &backends)?;

    for (name, routes) in app.route_manifest() {
        tracing::info!(resource = name, ?routes, "routes");
        for view in [ViewKind::Index, ViewKind::Form] {
            if let Some(tree) = app.layout(name, view) {
                println!("{}", serde_json::to_string_pretty(tree)?);
            }
        }
    }

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return Ok(());
    };
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    for resource in app.registry.iter().filter(|r| !r.is_embedded()) {
        let Some(table) = resource.opts.get("table").and_then(|t| t.as_str()) else {
            continue;
        };
        let query = translate_for(resource, SelectQuery::from_resource(resource, table), &resource.query_opts()).limit(50);
        let buf = query.build();
        let rows = buf.to_query().fetch_all(&pool).await?;
        tracing::info!(resource = %resource.name, sql = %buf.sql, rows = rows.len(), "index query");
    }
    Ok(())
}
