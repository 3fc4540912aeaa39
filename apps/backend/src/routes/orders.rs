use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::txn::with_txn;
use crate::domain::OrderEvent;
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::errors::ErrorCode;
use crate::extractors::ValidatedJson;
use crate::repos::orders::Order;
use crate::services::channels::{self, ChannelContact};
use crate::services::customers::{self, NewCustomer};
use crate::services::orders::{self, CreateOrder, OrderPatch};
use crate::state::app_state::AppState;

/// Purchase request. The buyer is either an existing `customer_id` or a
/// `customer` record resolved by phone/email.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub raffle_id: i64,
    pub customer_id: Option<i64>,
    pub customer: Option<NewCustomer>,
    pub tickets: Vec<i32>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order: Order,
    /// Who the buyer should contact to complete payment
    pub contact: Option<ChannelContact>,
}

#[derive(Debug, Serialize)]
pub struct ExpireOverdueResponse {
    pub expired: u64,
}

fn parse_event(action: &str) -> Result<OrderEvent, AppError> {
    match action {
        "paid" => Ok(OrderEvent::MarkPaid),
        "pending" => Ok(OrderEvent::MarkPending),
        "cancel" => Ok(OrderEvent::Cancel),
        "release" => Ok(OrderEvent::Release),
        "expire" => Ok(OrderEvent::Expire),
        other => Err(AppError::not_found(
            ErrorCode::NotFound,
            format!("Unknown order action '{other}'"),
        )),
    }
}

async fn create_order(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: ValidatedJson<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let engine = app_state.engine().clone();

    let response = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move {
            let customer_id = match (body.customer_id, body.customer) {
                (Some(id), _) => id,
                (None, Some(new)) => customers::ensure_customer(txn, new).await?.id,
                (None, None) => {
                    return Err(DomainError::validation_other(
                        "Either customer_id or customer is required",
                    )
                    .into())
                }
            };

            let mut create = CreateOrder::new(body.raffle_id, customer_id, body.tickets);
            create.payment_method = body.payment_method;
            create.notes = body.notes;

            let order = orders::create_order(txn, &engine, create).await?;
            let contact = channels::next_channel(txn, &engine, Some(order.raffle_id)).await?;
            Ok::<_, AppError>(CreateOrderResponse { order, contact })
        })
    })
    .await?;

    Ok(HttpResponse::Created().json(response))
}

async fn get_order(
    req: HttpRequest,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { orders::get_order(txn, order_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn get_by_folio(
    req: HttpRequest,
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let folio = path.into_inner();
    let order = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { orders::find_by_folio(txn, &folio).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn edit_order(
    req: HttpRequest,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
    body: ValidatedJson<OrderPatch>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let patch = body.into_inner();
    let order = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { orders::edit_order(txn, order_id, patch).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn delete_order(
    req: HttpRequest,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { orders::delete_order(txn, order_id).await })
    })
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn transition(
    req: HttpRequest,
    path: web::Path<(i64, String)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (order_id, action) = path.into_inner();
    let event = parse_event(&action)?;
    let order = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { orders::transition(txn, order_id, event).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn expire_overdue(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let now = OffsetDateTime::now_utc();
    let expired = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move { orders::expire_overdue(txn, now).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(ExpireOverdueResponse { expired }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Literal segments first so they are not captured by `{order_id}`
    cfg.route("", web::post().to(create_order))
        .route("/expire-overdue", web::post().to(expire_overdue))
        .route("/by-folio/{folio}", web::get().to(get_by_folio))
        .service(
            web::resource("/{order_id}")
                .route(web::get().to(get_order))
                .route(web::patch().to(edit_order))
                .route(web::delete().to(delete_order)),
        )
        .route("/{order_id}/{action}", web::post().to(transition));
}
