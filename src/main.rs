use anyhow::Context;
use library_inventory::{
    adapters::postgres::{PostgresCatalogStore, PostgresLoanLedger, Statements, ensure_schema},
    application::inventory::ServiceDependencies,
    config::AppConfig,
    console::Console,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    // Initialize tracing; stdout belongs to the console
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("library_inventory={},sqlx=warn", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    let sql = Arc::new(Statements::new(&config.schema));
    if config.database.create_schema {
        ensure_schema(&pool, &sql).await?;
    }

    let deps = ServiceDependencies::new(
        Arc::new(PostgresCatalogStore::new(
            pool.clone(),
            sql.clone(),
            config.limits.max_members,
        )),
        Arc::new(PostgresLoanLedger::new(
            pool.clone(),
            sql,
            config.limits.max_loans_per_member,
        )),
    );

    tracing::info!(
        max_members = config.limits.max_members,
        max_loans_per_member = config.limits.max_loans_per_member,
        "library inventory ready"
    );

    let console = Console::new(deps, &config);
    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    pool.close().await;
    Ok(())
}
