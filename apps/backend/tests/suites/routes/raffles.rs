use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::unique_phone;
use raffle_backend::AppError;
use serde_json::json;

use crate::common::read_json;
use crate::support::factory;
use crate::support::{build_test_state, create_test_app};

#[tokio::test]
async fn create_publish_and_finish() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::post()
        .uri("/api/raffles")
        .set_json(json!({
            "title": "Spring raffle",
            "ticket_count": 100,
            "price_cents": 2500,
            "bonus_enabled": true,
            "bonus_multiplier": 2,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = read_json(resp).await;
    assert_eq!(created["status"], "draft");
    assert_eq!(created["sold"], 0);
    let id = created["id"].as_i64().expect("id");

    let req = test::TestRequest::post()
        .uri(&format!("/api/raffles/{id}/publish"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["status"], "active");

    let req = test::TestRequest::post()
        .uri(&format!("/api/raffles/{id}/publish"))
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
        .uri(&format!("/api/raffles/{id}/finish"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(read_json(resp).await["status"], "finished");

    let req = test::TestRequest::get().uri("/api/raffles").to_request();
    let list = read_json(test::call_service(&app, req).await).await;
    assert!(list
        .as_array()
        .expect("array")
        .iter()
        .any(|r| r["id"].as_i64() == Some(id)));
    Ok(())
}

#[tokio::test]
async fn invalid_configuration_is_unprocessable() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::post()
        .uri("/api/raffles")
        .set_json(json!({ "title": "bad", "ticket_count": 0, "price_cents": 100 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_RAFFLE_CONFIG",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;

    let req = test::TestRequest::get().uri("/api/raffles/987654321").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "RAFFLE_NOT_FOUND",
        StatusCode::NOT_FOUND,
        None,
    )
    .await;
    Ok(())
}

#[tokio::test]
async fn patch_is_locked_while_orders_are_live() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db").clone();
    let raffle = factory::active_raffle(&db, 10).await?;
    factory::order(&db, state.engine(), raffle.id, &[3]).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/raffles/{}", raffle.id))
        .set_json(json!({ "price_cents": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "RAFFLE_LOCKED",
        StatusCode::CONFLICT,
        None,
    )
    .await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/raffles/{}", raffle.id))
        .set_json(json!({ "title": "New title" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["title"], "New title");
    Ok(())
}

#[tokio::test]
async fn occupancy_endpoints() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db").clone();
    let raffle = factory::active_raffle(&db, 20).await?;
    factory::order(&db, state.engine(), raffle.id, &[4, 9]).await?;
    factory::order(&db, state.engine(), raffle.id, &[15]).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/raffles/{}/occupied?limit=2&sort=desc", raffle.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = read_json(resp).await;
    assert_eq!(page["numbers"], json!([15, 9]));
    assert_eq!(page["total"], 3);
    assert_eq!(page["limit"], 2);

    let req = test::TestRequest::post()
        .uri(&format!("/api/raffles/{}/tickets/validate", raffle.id))
        .set_json(json!({ "numbers": [1, 9, 15, 20] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(read_json(resp).await, json!({ "taken": [9, 15] }));

    let req = test::TestRequest::get()
        .uri(&format!("/api/raffles/{}/orders?status=PENDING", raffle.id))
        .to_request();
    let orders = read_json(test::call_service(&app, req).await).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(2));

    let req = test::TestRequest::get()
        .uri(&format!("/api/raffles/{}/orders?status=PAID", raffle.id))
        .to_request();
    let orders = read_json(test::call_service(&app, req).await).await;
    assert_eq!(orders, json!([]));
    Ok(())
}

#[tokio::test]
async fn import_endpoint_returns_a_summary() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let db = state.db().expect("db").clone();
    let raffle = factory::active_raffle(&db, 10).await?;
    factory::order(&db, state.engine(), raffle.id, &[2]).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let phone = unique_phone();
    let req = test::TestRequest::post()
        .uri(&format!("/api/raffles/{}/tickets/import", raffle.id))
        .set_json(json!({
            "rows": [
                { "name": "Ana", "phone": phone, "ticket": 1 },
                { "name": "Ana", "phone": phone, "ticket_number": 2 },
                { "name": "Ana", "phone": phone, "ticket": 3 },
                { "name": "Bo", "phone": "---", "ticket": 4 },
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let summary = read_json(resp).await;
    assert_eq!(summary["success"], 2);
    assert_eq!(summary["failed"], 2);
    assert_eq!(
        summary["errors"],
        json!(["row 2: ALREADY_TAKEN (ticket 2)", "row 4: INVALID_PHONE (ticket 4)"])
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/raffles/{}", raffle.id))
        .to_request();
    let raffle_json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(raffle_json["sold"], 3);
    Ok(())
}
