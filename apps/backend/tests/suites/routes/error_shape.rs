use actix_web::http::StatusCode;
use actix_web::{test, web, App, HttpResponse};
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use raffle_backend::errors::ErrorCode;
use raffle_backend::middleware::RequestTrace;
use raffle_backend::AppError;
use serde_json::json;

use crate::support::{build_test_state, create_test_app};

async fn failing_handler() -> Result<HttpResponse, AppError> {
    Err(AppError::invalid(ErrorCode::TicketOutOfRange, "Ticket 0 is out of range"))
}

#[actix_web::test]
async fn problem_details_carry_the_trace_id() {
    let app = test::init_service(
        App::new()
            .wrap(RequestTrace)
            .route("/_test/error", web::get().to(failing_handler)),
    )
    .await;

    let req = test::TestRequest::get().uri("/_test/error").to_request();
    let resp = test::call_service(&app, req).await;

    let headers = resp.headers().clone();
    let request_id = headers
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .expect("ascii header")
        .to_string();
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/problem+json")
    );

    let problem = assert_problem_details_from_service_response(
        resp,
        "TICKET_OUT_OF_RANGE",
        StatusCode::UNPROCESSABLE_ENTITY,
        Some("out of range"),
    )
    .await;
    assert_eq!(problem.trace_id, request_id);
    assert_eq!(problem.title, "Ticket Out Of Range");
    assert!(problem.taken.is_none());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::post()
        .uri("/api/raffles")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"title\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(resp, "BAD_REQUEST", StatusCode::BAD_REQUEST, None)
        .await;

    let req = test::TestRequest::post()
        .uri("/api/raffles")
        .set_json(json!({ "title": "missing count", "price_cents": 100 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "BAD_REQUEST",
        StatusCode::BAD_REQUEST,
        Some("ticket_count"),
    )
    .await;
    Ok(())
}

#[tokio::test]
async fn conflicts_list_the_taken_numbers() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db").clone();
    let raffle = crate::support::factory::active_raffle(&db, 10).await?;
    crate::support::factory::order(&db, state.engine(), raffle.id, &[2, 5]).await?;

    let app = create_test_app(state).with_prod_routes().build().await;
    let req = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({
            "raffle_id": raffle.id,
            "customer": { "name": "Late buyer", "phone": "+52 55 0000 0001" },
            "tickets": [5, 1, 2],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    let problem = assert_problem_details_from_service_response(
        resp,
        "TICKETS_ALREADY_TAKEN",
        StatusCode::CONFLICT,
        None,
    )
    .await;
    assert_eq!(problem.taken, Some(vec![2, 5]));
    Ok(())
}
