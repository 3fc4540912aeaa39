use crate::config::db::{DbKind, RuntimeEnv};
use crate::config::engine::EngineConfig;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::services::Engine;
use crate::state::app_state::AppState;

/// Builder for `AppState`, shared by `main` and the test harness
pub struct StateBuilder {
    env: RuntimeEnv,
    db_kind: Option<DbKind>,
    engine: Engine,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            env: RuntimeEnv::Prod,
            db_kind: None,
            engine: Engine::default(),
        }
    }

    pub fn with_env(mut self, env: RuntimeEnv) -> Self {
        self.env = env;
        self
    }

    pub fn with_db(mut self, kind: DbKind) -> Self {
        self.db_kind = Some(kind);
        self
    }

    pub fn with_engine(mut self, config: EngineConfig) -> Self {
        self.engine = Engine::new(config);
        self
    }

    /// Use a pre-built engine, e.g. one with injected entropy.
    pub fn with_engine_instance(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        match self.db_kind {
            // single entrypoint: connect + migrate
            Some(kind) => {
                let conn = bootstrap_db(kind, self.env).await?;
                Ok(AppState::new(conn, self.engine))
            }
            None => Ok(AppState::without_db(self.engine)),
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
