use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Storage engine the backend connects to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// PostgreSQL (production)
    Postgres,
    /// SQLite database file at `SQLITE_PATH`
    SqliteFile,
    /// Private in-memory SQLite database (tests)
    SqliteMemory,
}

impl FromStr for DbKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite-file" | "sqlite_file" | "sqlite" => Ok(Self::SqliteFile),
            "sqlite-memory" | "sqlite_memory" | "memory" => Ok(Self::SqliteMemory),
            other => Err(AppError::config(format!(
                "Unknown database kind '{other}'. Use: postgres | sqlite-file | sqlite-memory"
            ))),
        }
    }
}

/// Runtime environment, selects the database name and its safety rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    Prod,
    Test,
}

/// Database owner enum for different access levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbOwner {
    /// Application-level access (limited permissions)
    App,
    /// Owner-level access (full permissions for migrations)
    Owner,
}

/// Read `DATABASE_KIND`, defaulting to Postgres when unset.
pub fn db_kind_from_env() -> Result<DbKind, AppError> {
    match env::var("DATABASE_KIND") {
        Ok(value) => value.parse(),
        Err(_) => Ok(DbKind::Postgres),
    }
}

/// Build the connection string for the given kind, environment and owner.
pub fn make_conn_spec(kind: DbKind, env: RuntimeEnv, owner: DbOwner) -> Result<String, AppError> {
    match kind {
        DbKind::Postgres => db_url(env, owner),
        DbKind::SqliteFile => {
            let path = must_var("SQLITE_PATH")?;
            Ok(format!("sqlite://{path}?mode=rwc"))
        }
        DbKind::SqliteMemory => Ok("sqlite::memory:".to_string()),
    }
}

/// Builds a Postgres URL from environment variables based on environment and owner
pub fn db_url(env: RuntimeEnv, owner: DbOwner) -> Result<String, AppError> {
    let host = host();
    let port = port();
    let db_name = db_name(env)?;
    let (username, password) = credentials(owner)?;

    Ok(format!(
        "postgresql://{username}:{password}@{host}:{port}/{db_name}"
    ))
}

fn host() -> String {
    env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string())
}

fn port() -> String {
    env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string())
}

fn db_name(env: RuntimeEnv) -> Result<String, AppError> {
    match env {
        RuntimeEnv::Prod => must_var("PROD_DB"),
        RuntimeEnv::Test => {
            let db_name = must_var("TEST_DB")?;
            // Enforce safety: test DB must end with "_test"
            if !db_name.ends_with("_test") {
                return Err(AppError::config(format!(
                    "Test environment requires database name to end with '_test', but got: '{db_name}'"
                )));
            }
            Ok(db_name)
        }
    }
}

fn credentials(owner: DbOwner) -> Result<(String, String), AppError> {
    match owner {
        DbOwner::App => Ok((must_var("APP_DB_USER")?, must_var("APP_DB_PASSWORD")?)),
        DbOwner::Owner => Ok((
            must_var("RAFFLE_OWNER_USER")?,
            must_var("RAFFLE_OWNER_PASSWORD")?,
        )),
    }
}

/// Get required environment variable or return error
fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}
