use actix_web::web;

pub mod channels;
pub mod health;
pub mod orders;
pub mod raffles;

/// Register every route. `main.rs` wraps this with the tracing middleware;
/// tests call it directly.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check: /health
    cfg.configure(health::configure_routes);

    // Raffle catalog, occupancy and bulk import: /api/raffles/**
    cfg.service(web::scope("/api/raffles").configure(raffles::configure_routes));

    // Orders and their lifecycle: /api/orders/**
    cfg.service(web::scope("/api/orders").configure(orders::configure_routes));

    // Contact channels: /api/channels/**
    cfg.service(web::scope("/api/channels").configure(channels::configure_routes));
}
