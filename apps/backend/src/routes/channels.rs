use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::db::txn::with_txn;
use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::repos::channels::Channel;
use crate::services::channels;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct NextChannelQuery {
    pub raffle_id: Option<i64>,
}

async fn next_channel(
    req: HttpRequest,
    query: web::Query<NextChannelQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raffle_id = query.into_inner().raffle_id;
    let engine = app_state.engine().clone();
    let contact = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move {
            channels::next_channel(txn, &engine, raffle_id)
                .await
                .map_err(AppError::from)
        })
    })
    .await?;

    // No channel and no legacy contact: nothing to hand out
    Ok(match contact {
        Some(c) => HttpResponse::Ok().json(c),
        None => HttpResponse::NoContent().finish(),
    })
}

async fn list_channels(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let list = with_txn(Some(&req), &app_state, |txn| {
        Box::pin(async move { channels::list_channels(txn).await.map_err(AppError::from) })
    })
    .await?;
    Ok(HttpResponse::Ok().json(list))
}

async fn replace_channels(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: ValidatedJson<Vec<Channel>>,
) -> Result<HttpResponse, AppError> {
    let list = body.into_inner();
    let stored = with_txn(Some(&req), &app_state, move |txn| {
        Box::pin(async move {
            channels::replace_channels(txn, list)
                .await
                .map_err(AppError::from)
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(stored))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_channels))
            .route(web::put().to(replace_channels)),
    )
    .route("/next", web::get().to(next_channel));
}
