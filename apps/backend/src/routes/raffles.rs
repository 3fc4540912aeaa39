use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::db::require_db;
use crate::db::txn::with_txn;
use crate::entities::orders::OrderStatus;
use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::services::importer::{self, ImportRow};
use crate::services::occupancy::{self, PageRequest};
use crate::services::raffles::{self, NewRaffle, RafflePatch};
use crate::services::orders;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateTicketsRequest {
    pub numbers: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct ValidateTicketsResponse {
    pub taken: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<ImportRow>,
}

#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

async fn create_raffle(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: ValidatedJson<NewRaffle>,
) -> Result<HttpResponse, AppError> {
    let new = body.into_inner();
    let raffle = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { raffles::create_raffle(txn, new).await })
    })
    .await?;
    Ok(HttpResponse::Created().json(raffle))
}

async fn list_raffles(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let list = with_txn(Some(&req), &app_state, |txn| {
        Box::pin(async move { raffles::list_raffles(txn).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(list))
}

async fn get_raffle(
    req: HttpRequest,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = path.into_inner();
    let raffle = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { raffles::get_raffle(txn, raffle_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(raffle))
}

async fn update_raffle(
    req: HttpRequest,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
    body: ValidatedJson<RafflePatch>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = path.into_inner();
    let patch = body.into_inner();
    let raffle = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { raffles::update_raffle(txn, raffle_id, patch).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(raffle))
}

async fn publish_raffle(
    req: HttpRequest,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = path.into_inner();
    let raffle = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { raffles::publish_raffle(txn, raffle_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(raffle))
}

async fn finish_raffle(
    req: HttpRequest,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = path.into_inner();
    let raffle = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { raffles::finish_raffle(txn, raffle_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(raffle))
}

async fn occupied(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<PageRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = path.into_inner();
    let page = query.into_inner();
    let page = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { occupancy::occupied_page(txn, raffle_id, page).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn validate_tickets(
    req: HttpRequest,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
    body: ValidatedJson<ValidateTicketsRequest>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = path.into_inner();
    let numbers = body.into_inner().numbers;
    let taken = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { occupancy::validate_tickets(txn, raffle_id, &numbers).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(ValidateTicketsResponse { taken }))
}

/// Bulk import runs one transaction per customer group, so it takes the
/// pool directly instead of a request transaction.
async fn import_tickets(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
    body: ValidatedJson<ImportRequest>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = path.into_inner();
    let rows = body.into_inner().rows;
    let db = require_db(&app_state)?;
    let summary = importer::import_tickets(db, app_state.engine(), raffle_id, rows).await?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn list_orders(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<OrderFilter>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = path.into_inner();
    let status = query.into_inner().status;
    let list = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { orders::list_orders(txn, raffle_id, status).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(list))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_raffles))
            .route(web::post().to(create_raffle)),
    )
    .service(
        web::resource("/{raffle_id}")
            .route(web::get().to(get_raffle))
            .route(web::patch().to(update_raffle)),
    )
    .route("/{raffle_id}/publish", web::post().to(publish_raffle))
    .route("/{raffle_id}/finish", web::post().to(finish_raffle))
    .route("/{raffle_id}/occupied", web::get().to(occupied))
    .route("/{raffle_id}/orders", web::get().to(list_orders))
    .route("/{raffle_id}/tickets/validate", web::post().to(validate_tickets))
    .route("/{raffle_id}/tickets/import", web::post().to(import_tickets));
}
