mod common;
mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use common::assert_problem_details;
use habits_test_support::unique::{unique_email, unique_str};
use serde_json::{json, Value};
use support::{bearer, build_test_state, create_test_app, login};

async fn setup() -> Result<
    (
        impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        String,
        i64,
    ),
    Box<dyn std::error::Error>,
> {
    let state = build_test_state().await?;
    let app = create_test_app(state).with_prod_routes().build().await;
    let token = login(&app, &unique_email("logs"), &unique_str("sub")).await;

    let req = test::TestRequest::post()
        .uri("/api/habits")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Floss" }))
        .to_request();
    let habit: Value = test::call_and_read_body_json(&app, req).await;
    let id = habit["id"].as_i64().unwrap();
    Ok((app, token, id))
}

#[actix_web::test]
async fn duplicate_day_is_a_conflict() -> Result<(), Box<dyn std::error::Error>> {
    let (app, token, id) = setup().await?;
    let uri = format!("/api/habits/{id}/logs");

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&token))
        .set_json(json!({ "date": "2024-03-10", "note": "evening" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let log: Value = test::read_body_json(resp).await;
    assert_eq!(log["completed_on"], "2024-03-10");
    assert_eq!(log["note"], "evening");

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&token))
        .set_json(json!({ "date": "2024-03-10" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details(resp, "LOG_ALREADY_EXISTS", StatusCode::CONFLICT, None).await;

    Ok(())
}

#[actix_web::test]
async fn empty_body_logs_today() -> Result<(), Box<dyn std::error::Error>> {
    let (app, token, id) = setup().await?;

    let req = test::TestRequest::post()
        .uri(&format!("/api/habits/{id}/logs"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let log: Value = test::read_body_json(resp).await;

    let today = time::OffsetDateTime::now_utc().date();
    let expected = format!(
        "{:04}-{:02}-{:02}",
        today.year(),
        u8::from(today.month()),
        today.day()
    );
    assert_eq!(log["completed_on"], expected.as_str());

    Ok(())
}

#[actix_web::test]
async fn list_is_newest_first_and_range_checked() -> Result<(), Box<dyn std::error::Error>> {
    let (app, token, id) = setup().await?;
    let uri = format!("/api/habits/{id}/logs");

    for date in ["2024-01-01", "2024-01-03", "2024-01-02"] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "date": date }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&token))
        .to_request();
    let logs: Value = test::call_and_read_body_json(&app, req).await;
    let days: Vec<&str> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["completed_on"].as_str().unwrap())
        .collect();
    assert_eq!(days, vec!["2024-01-03", "2024-01-02", "2024-01-01"]);

    let req = test::TestRequest::get()
        .uri(&format!("{uri}?from=2024-01-02&to=2024-01-02"))
        .insert_header(bearer(&token))
        .to_request();
    let logs: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("{uri}?from=2024-01-03&to=2024-01-01"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details(resp, "INVALID_DATE_RANGE", StatusCode::BAD_REQUEST, None).await;

    let req = test::TestRequest::get()
        .uri(&format!("{uri}?from=January"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details(resp, "INVALID_DATE", StatusCode::BAD_REQUEST, None).await;

    Ok(())
}

#[actix_web::test]
async fn delete_by_date() -> Result<(), Box<dyn std::error::Error>> {
    let (app, token, id) = setup().await?;

    let req = test::TestRequest::post()
        .uri(&format!("/api/habits/{id}/logs"))
        .insert_header(bearer(&token))
        .set_json(json!({ "date": "2024-06-01" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/habits/{id}/logs/2024-06-01"))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/habits/{id}/logs/2024-06-01"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details(resp, "LOG_NOT_FOUND", StatusCode::NOT_FOUND, None).await;

    Ok(())
}

#[actix_web::test]
async fn logs_of_foreign_habit_are_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let (app, _owner, id) = setup().await?;
    let other = login(&app, &unique_email("other"), &unique_str("sub")).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/habits/{id}/logs"))
        .insert_header(bearer(&other))
        .set_json(json!({ "date": "2024-06-01" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details(resp, "HABIT_NOT_FOUND", StatusCode::NOT_FOUND, None).await;

    Ok(())
}
