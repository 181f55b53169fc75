mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, TestApp};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

const PREREQUISITES: [&str; 7] = [
    "/api/resource/KRA/Work%20Quality",
    "/api/resource/KRA/Timeliness",
    "/api/resource/KRA/Collaboration",
    "/api/resource/Employee%20Feedback%20Criteria/Communication",
    "/api/resource/Employee%20Feedback%20Criteria/Ownership",
    "/api/resource/Employee%20Feedback%20Criteria/Problem%20Solving",
    "/api/resource/Appraisal%20Template/Standard%20Appraisal",
];

/// Each prerequisite is missing on the first lookup and present afterwards,
/// the way the ERP behaves once the first run created it.
async fn mount_prerequisites(app: &TestApp) {
    for prerequisite in PREREQUISITES {
        Mock::given(method("GET"))
            .and(path(prerequisite))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "exc_type": "DoesNotExistError"
            })))
            .up_to_n_times(1)
            .mount(&app.erp)
            .await;
        Mock::given(method("GET"))
            .and(path(prerequisite))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": prerequisite.rsplit('/').next() }
            })))
            .mount(&app.erp)
            .await;
    }

    Mock::given(method("POST"))
        .and(path_regex(
            r"^/api/resource/(KRA|Employee%20Feedback%20Criteria|Appraisal%20Template)$",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "created" } })))
        .expect(7)
        .mount(&app.erp)
        .await;
}

async fn mount_designations(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/api/resource/Designation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "name": "Engineer", "appraisal_template": null },
                { "name": "Manager", "appraisal_template": "Leadership" }
            ]
        })))
        .up_to_n_times(1)
        .mount(&app.erp)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/resource/Designation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "name": "Engineer", "appraisal_template": "Standard Appraisal" },
                { "name": "Manager", "appraisal_template": "Leadership" }
            ]
        })))
        .mount(&app.erp)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/resource/Designation/Engineer"))
        .and(body_partial_json(json!({ "appraisal_template": "Standard Appraisal" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "Engineer" } })))
        .expect(1)
        .mount(&app.erp)
        .await;
}

fn pulled_cycle(template: Value) -> Value {
    json!({
        "docs": [{
            "name": "Q3-2024",
            "modified": "2024-07-01 10:00:00",
            "appraisees": [
                { "employee": "EMP-1", "appraisal_template": template },
                { "employee": "EMP-2", "appraisal_template": "Leadership" }
            ]
        }]
    })
}

async fn mount_cycle(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/api/resource/Appraisal%20Cycle/Q3-2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "name": "Q3-2024", "modified": "2024-07-01 09:00:00" }
        })))
        .mount(&app.erp)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/method/run_doc_method"))
        .and(body_partial_json(json!({ "method": "set_employees" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(pulled_cycle(Value::Null)))
        .up_to_n_times(1)
        .mount(&app.erp)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/method/run_doc_method"))
        .and(body_partial_json(json!({ "method": "set_employees" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(pulled_cycle(json!("Standard Appraisal"))),
        )
        .mount(&app.erp)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/resource/Appraisal%20Cycle/Q3-2024"))
        .and(body_partial_json(json!({
            "modified": "2024-07-01 10:00:00",
            "appraisees": [
                { "employee": "EMP-1", "appraisal_template": "Standard Appraisal" },
                { "employee": "EMP-2", "appraisal_template": "Leadership" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "name": "Q3-2024",
                "appraisees": [{ "employee": "EMP-1" }, { "employee": "EMP-2" }]
            }
        })))
        .expect(2)
        .mount(&app.erp)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/method/run_doc_method"))
        .and(body_partial_json(json!({ "method": "create_appraisals" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": null })))
        .expect(2)
        .mount(&app.erp)
        .await;
}

#[tokio::test]
async fn repeated_initiation_creates_prerequisites_once() {
    let app = TestApp::new().await;
    mount_prerequisites(&app).await;
    mount_designations(&app).await;
    mount_cycle(&app).await;

    let first = app
        .request(Method::POST, "/api/appraisals/cycles/Q3-2024/initiate", None)
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = json_body(first).await;
    assert_eq!(first["data"]["cycle"], "Q3-2024");
    assert_eq!(first["data"]["bootstrapped"].as_array().map(Vec::len), Some(7));
    assert_eq!(first["data"]["designations_linked"], json!(["Engineer"]));
    assert_eq!(first["data"]["templates_assigned"], 1);
    assert_eq!(first["data"]["appraisees"], 2);

    let second = app
        .request(Method::POST, "/api/appraisals/cycles/Q3-2024/initiate", None)
        .await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = json_body(second).await;
    assert_eq!(second["data"]["bootstrapped"], json!([]));
    assert_eq!(second["data"]["designations_linked"], json!([]));
    assert_eq!(second["data"]["templates_assigned"], 0);
    assert_eq!(second["data"]["appraisees"], 2);
}

#[tokio::test]
async fn initiating_an_unknown_cycle_is_not_found() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/api/resource/Appraisal%20Cycle/Missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.erp)
        .await;

    let response = app
        .request(Method::POST, "/api/appraisals/cycles/Missing/initiate", None)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn new_cycle_defaults_to_manual_rating() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/api/resource/Appraisal%20Cycle"))
        .and(body_partial_json(json!({
            "cycle_name": "H2-2024",
            "kra_evaluation_method": "Manual Rating",
            "company": "Acme Ltd"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "name": "H2-2024", "cycle_name": "H2-2024" }
        })))
        .expect(1)
        .mount(&app.erp)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/appraisals/cycles",
            Some(json!({
                "cycle_name": "H2-2024",
                "start_date": "2024-07-01",
                "end_date": "2024-12-31"
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["name"], "H2-2024");
}
