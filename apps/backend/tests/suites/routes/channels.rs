use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use raffle_backend::{AppError, Engine, EngineConfig};
use serde_json::json;
use serial_test::serial;

use crate::common::read_json;
use crate::support::{build_test_state_with, create_test_app};

fn engine_for(role: &str) -> Engine {
    Engine::new(EngineConfig {
        contact_role: role.to_string(),
        legacy_contact: None,
        ..Default::default()
    })
}

#[tokio::test]
#[serial]
async fn save_list_and_rotate() -> Result<(), AppError> {
    let role = format!("sales-{}", ulid::Ulid::new());
    let state = build_test_state_with(engine_for(&role)).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::put()
        .uri("/api/channels")
        .set_json(json!([
            { "phone": "+52 1 111", "display_name": "Uno", "active": true, "role": role },
            { "phone": "222", "display_name": "Dos", "active": true, "role": role },
            { "phone": "333", "display_name": "Off", "active": false, "role": role },
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let stored = read_json(resp).await;
    assert_eq!(stored[0]["phone"], "521111");
    assert_eq!(stored[0]["assigned_raffle_ids"], json!([]));

    let req = test::TestRequest::get().uri("/api/channels").to_request();
    let listed = read_json(test::call_service(&app, req).await).await;
    assert_eq!(listed, stored);

    let mut names = Vec::new();
    for _ in 0..3 {
        let req = test::TestRequest::get()
            .uri("/api/channels/next?raffle_id=1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        names.push(read_json(resp).await["display_name"].clone());
    }
    assert_eq!(names, vec![json!("Uno"), json!("Dos"), json!("Uno")]);
    Ok(())
}

#[tokio::test]
#[serial]
async fn nothing_to_hand_out_is_no_content() -> Result<(), AppError> {
    let role = format!("empty-{}", ulid::Ulid::new());
    let state = build_test_state_with(engine_for(&role)).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::get().uri("/api/channels/next").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
#[serial]
async fn save_rejects_bad_phones() -> Result<(), AppError> {
    let state = build_test_state_with(engine_for("sales")).await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::put()
        .uri("/api/channels")
        .set_json(json!([
            { "phone": "n/a", "display_name": "Broken", "active": true, "role": "sales" },
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_PHONE",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;
    Ok(())
}
