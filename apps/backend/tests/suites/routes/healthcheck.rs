use actix_web::http::StatusCode;
use actix_web::test;
use raffle_backend::AppError;

use crate::common::read_json;
use crate::support::{build_test_state, create_test_app};

#[tokio::test]
async fn health_reports_database_and_migrations() -> Result<(), AppError> {
    let state = build_test_state().await?;
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let body = read_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "ok");
    assert!(body.get("db_error").is_none());
    let migrations = body["migrations"].as_str().expect("migrations");
    assert_ne!(migrations, "unknown");
    assert_ne!(migrations, "no_migrations");
    Ok(())
}
