use sqlx::{postgres::PgPoolOptions, PgPool};

/// Creates a lazily connected PostgreSQL pool.
///
/// Connections are only established on first use, so an unreachable
/// database never prevents startup; the durable cache tier is best-effort
/// and individual query failures are handled (and swallowed) at call sites.
pub fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(database_url)?;

    Ok(pool)
}

/// Applies embedded migrations, logging rather than failing when the
/// database is unavailable.
pub async fn run_migrations(pool: &PgPool) {
    if let Err(e) = sqlx::migrate!().run(pool).await {
        tracing::warn!(error = %e, "Migrations not applied, durable cache may be unavailable");
    }
}
