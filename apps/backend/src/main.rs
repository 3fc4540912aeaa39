use actix_web::{web, App, HttpServer};
use raffle_backend::config::db::{db_kind_from_env, RuntimeEnv};
use raffle_backend::config::engine::EngineConfig;
use raffle_backend::infra::state::build_state;
use raffle_backend::middleware::{RequestTrace, StructuredLogger, TraceSpan};
use raffle_backend::routes;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment is supplied by the runtime (compose env_file, systemd, or a sourced .env)
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = match std::env::var("BACKEND_PORT") {
        Ok(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                error!(value = %raw, "BACKEND_PORT must be a valid port number");
                std::process::exit(1);
            }
        },
        Err(_) => 3001,
    };

    let engine_config = match EngineConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "invalid engine configuration");
            std::process::exit(1);
        }
    };
    let db_kind = match db_kind_from_env() {
        Ok(kind) => kind,
        Err(e) => {
            error!(error = %e, "invalid database configuration");
            std::process::exit(1);
        }
    };

    let app_state = match build_state()
        .with_env(RuntimeEnv::Prod)
        .with_db(db_kind)
        .with_engine(engine_config)
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    info!(%host, port, ?db_kind, "starting raffle backend");

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
