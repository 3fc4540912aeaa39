use sea_orm::DatabaseConnection;

use crate::services::Engine;

/// Application state shared by every worker
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database connection (absent in some test scenarios)
    db: Option<DatabaseConnection>,
    /// Engine tunables plus bonus-draw entropy
    engine: Engine,
}

impl AppState {
    pub fn new(db: DatabaseConnection, engine: Engine) -> Self {
        Self {
            db: Some(db),
            engine,
        }
    }

    /// State without a database; DB-backed handlers answer 503.
    pub fn without_db(engine: Engine) -> Self {
        Self { db: None, engine }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}
