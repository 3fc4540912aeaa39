//! Database connection and bootstrap.
//!
//! `bootstrap_db` is the single entrypoint used by `main` and tests: connect,
//! run pending migrations once, hand back a ready pool. Schema changes never
//! happen at request time.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use migration::{migrate, MigrationCommand};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::{info, warn};

use crate::config::db::{make_conn_spec, DbKind, DbOwner, RuntimeEnv};
use crate::error::AppError;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_INTERVAL_MS: u64 = 500;
const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn engine_name(kind: DbKind) -> &'static str {
    match kind {
        DbKind::Postgres => "postgresql",
        DbKind::SqliteFile | DbKind::SqliteMemory => "sqlite",
    }
}

/// Retry a connection attempt with fixed interval delays.
/// Returns the error of the last attempt once all retries are exhausted.
async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(attempts = attempt, interval_ms, "connection_retry=success");
                }
                return Ok(result);
            }
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts,
                    interval_ms,
                    error = %e,
                    "connection_retry=failed"
                );
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// Pool shape for a SQLite backend.
///
/// SQLite admits one writer at a time and a deferred transaction that reads
/// before it writes cannot be retried by `busy_timeout`, so both kinds run
/// over a single connection and transactions queue on the pool instead of
/// failing with SQLITE_BUSY. The in-memory database also lives inside that
/// connection, so it never idles out.
fn sqlite_pool_options(kind: DbKind) -> SqlitePoolOptions {
    let pool_options = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1);
    match kind {
        DbKind::SqliteMemory => pool_options.idle_timeout(None).max_lifetime(None),
        DbKind::SqliteFile | DbKind::Postgres => pool_options,
    }
}

/// SQLite pool with foreign keys enforced.
async fn connect_sqlite(kind: DbKind, spec: &str) -> Result<DatabaseConnection, AppError> {
    let mut options = SqliteConnectOptions::from_str(spec)
        .map_err(|e| AppError::config(format!("Invalid SQLite connection string: {e}")))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(SQLITE_BUSY_TIMEOUT);
    if kind == DbKind::SqliteFile {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = sqlite_pool_options(kind);

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| AppError::db(format!("SQLite connection failed: {e}")))?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

async fn connect_postgres(url: &str) -> Result<DatabaseConnection, AppError> {
    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    Ok(Database::connect(options).await?)
}

/// Connect without running migrations.
pub async fn connect_db(
    kind: DbKind,
    env: RuntimeEnv,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let spec = make_conn_spec(kind, env, owner)?;
    let spec = spec.as_str();
    info!(engine = engine_name(kind), ?env, ?owner, "connecting to database");

    retry_connection(
        move || async move {
            match kind {
                DbKind::Postgres => connect_postgres(spec).await,
                DbKind::SqliteFile | DbKind::SqliteMemory => connect_sqlite(kind, spec).await,
            }
        },
        CONNECT_ATTEMPTS,
        CONNECT_INTERVAL_MS,
    )
    .await
}

/// Connect, apply pending migrations, and return the application pool.
///
/// Postgres migrates over a short-lived owner connection and then connects
/// with the app role; SQLite migrates over the same pool it returns, which
/// is the only option for an in-memory database.
pub async fn bootstrap_db(kind: DbKind, env: RuntimeEnv) -> Result<DatabaseConnection, AppError> {
    match kind {
        DbKind::Postgres => {
            let owner_conn = connect_db(kind, env, DbOwner::Owner).await?;
            run_migrations(&owner_conn).await?;
            if let Err(e) = owner_conn.close().await {
                warn!(error = %e, "failed to close owner connection after migrations");
            }
            connect_db(kind, env, DbOwner::App).await
        }
        DbKind::SqliteFile | DbKind::SqliteMemory => {
            let conn = connect_db(kind, env, DbOwner::App).await?;
            run_migrations(&conn).await?;
            Ok(conn)
        }
    }
}

/// Run a single migration command for the operator CLI.
///
/// Postgres runs over the owner role. An in-memory SQLite database would
/// vanish with the process, so it is rejected.
pub async fn orchestrate_migration(
    env: RuntimeEnv,
    kind: DbKind,
    command: MigrationCommand,
) -> Result<(), AppError> {
    if kind == DbKind::SqliteMemory {
        return Err(AppError::config(
            "in-memory SQLite cannot be migrated from the CLI; use postgres or sqlite-file",
        ));
    }

    let owner = match kind {
        DbKind::Postgres => DbOwner::Owner,
        DbKind::SqliteFile | DbKind::SqliteMemory => DbOwner::App,
    };
    info!(?env, ?kind, ?command, "migrate=start");

    let conn = connect_db(kind, env, owner).await?;
    let result = migrate(&conn, command)
        .await
        .map_err(|e| AppError::db(format!("Migration failed: {e}")));
    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close migration connection");
    }
    result?;

    info!("migrate=done");
    Ok(())
}

async fn run_migrations(conn: &DatabaseConnection) -> Result<(), AppError> {
    migrate(conn, MigrationCommand::Up)
        .await
        .map_err(|e| AppError::db(format!("Migration failed: {e}")))
}
