use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::unique_phone;
use raffle_backend::config::engine::LegacyContact;
use raffle_backend::{AppError, Engine, EngineConfig};
use serde_json::json;

use crate::common::read_json;
use crate::support::factory;
use crate::support::{build_test_state, build_test_state_with, create_test_app};

fn engine_with_desk() -> Engine {
    Engine::new(EngineConfig {
        contact_role: format!("desk-{}", ulid::Ulid::new()),
        legacy_contact: Some(LegacyContact {
            phone: "5215550000".into(),
            display_name: "Front desk".into(),
        }),
        ..Default::default()
    })
}

#[tokio::test]
async fn create_resolves_customer_and_returns_contact() -> Result<(), AppError> {
    let state = build_test_state_with(engine_with_desk()).await?;
    let db = state.db().expect("db").clone();
    let raffle = factory::active_raffle(&db, 50).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let phone = unique_phone();
    let req = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({
            "raffle_id": raffle.id,
            "customer": { "name": "Ana", "phone": phone },
            "tickets": [7, 3],
            "payment_method": "transfer",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = read_json(resp).await;

    let order = &body["order"];
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["ticket_numbers"], json!([7, 3]));
    assert_eq!(order["base_ticket_count"], 2);
    assert_eq!(order["total_cents"], 2 * factory::PRICE_CENTS);
    assert_eq!(order["payment_method"], "transfer");
    assert!(order["folio"].as_str().expect("folio").starts_with("RF-"));
    assert_eq!(
        body["contact"],
        json!({ "phone": "5215550000", "display_name": "Front desk" })
    );

    // same phone resolves to the same customer
    let req = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({
            "raffle_id": raffle.id,
            "customer": { "name": "Ana again", "phone": phone },
            "tickets": [8],
        }))
        .to_request();
    let second = read_json(test::call_service(&app, req).await).await;
    assert_eq!(second["order"]["customer_id"], order["customer_id"]);
    Ok(())
}

#[tokio::test]
async fn create_requires_a_buyer() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db").clone();
    let raffle = factory::active_raffle(&db, 10).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({ "raffle_id": raffle.id, "tickets": [1] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "VALIDATION_ERROR",
        StatusCode::UNPROCESSABLE_ENTITY,
        Some("customer"),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({
            "raffle_id": raffle.id,
            "customer": { "name": "x", "phone": "none" },
            "tickets": [1],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_PHONE",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({
            "raffle_id": raffle.id,
            "customer": { "name": "x", "phone": unique_phone() },
            "tickets": [11],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "TICKET_OUT_OF_RANGE",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;
    Ok(())
}

#[tokio::test]
async fn lifecycle_actions() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db").clone();
    let raffle = factory::active_raffle(&db, 10).await?;
    let order = factory::order(&db, state.engine(), raffle.id, &[1, 2]).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/orders/{}/pending", order.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(read_json(resp).await["status"], "PENDING");

    let req = test::TestRequest::post()
        .uri(&format!("/api/orders/{}/paid", order.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["status"], "PAID");

    let req = test::TestRequest::post()
        .uri(&format!("/api/orders/{}/expire", order.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_TRANSITION",
        StatusCode::CONFLICT,
        None,
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/orders/{}/refund", order.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(resp, "NOT_FOUND", StatusCode::NOT_FOUND, None)
        .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/orders/{}/release", order.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(read_json(resp).await["status"], "RELEASED");

    let req = test::TestRequest::get()
        .uri(&format!("/api/raffles/{}", raffle.id))
        .to_request();
    assert_eq!(read_json(test::call_service(&app, req).await).await["sold"], 0);
    Ok(())
}

#[tokio::test]
async fn lookup_edit_and_delete() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db").clone();
    let raffle = factory::active_raffle(&db, 10).await?;
    let order = factory::order(&db, state.engine(), raffle.id, &[4]).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/by-folio/{}", order.folio))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["id"], order.id);

    let req = test::TestRequest::get()
        .uri("/api/orders/by-folio/RF-NOPE")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "ORDER_NOT_FOUND",
        StatusCode::NOT_FOUND,
        None,
    )
    .await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/orders/{}", order.id))
        .set_json(json!({ "ticket_numbers": [4, 5], "notes": "called twice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let edited = read_json(resp).await;
    assert_eq!(edited["ticket_numbers"], json!([4, 5]));
    assert_eq!(edited["notes"], "called twice");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/orders/{}", order.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{}", order.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "ORDER_NOT_FOUND",
        StatusCode::NOT_FOUND,
        None,
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/raffles/{}/occupied", raffle.id))
        .to_request();
    let page = read_json(test::call_service(&app, req).await).await;
    assert_eq!(page["numbers"], json!([]));
    Ok(())
}

#[tokio::test]
async fn expire_overdue_sweeps() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::post()
        .uri("/api/orders/expire-overdue")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert!(body["expired"].as_u64().is_some());
    Ok(())
}
