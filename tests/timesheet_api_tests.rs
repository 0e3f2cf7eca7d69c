use actix_web::{http::StatusCode, test};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use timesheets::services::Role;

mod common;

use common::{TestContext, current_period, person, working_days};

fn month_uri(suffix: &str) -> String {
    let period = current_period();
    format!("/api/v1/timesheets/{}/{}{}", period.year, period.month, suffix)
}

#[actix_web::test]
async fn test_requests_without_token_are_unauthorized() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/timesheets/periods")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/timesheets/periods")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_periods_list_current_month_first() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);

    let req = test::TestRequest::get()
        .uri("/api/v1/timesheets/periods")
        .insert_header(ctx.bearer(&employee))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    let periods = body["data"].as_array().unwrap();
    assert!(!periods.is_empty());
    assert_eq!(periods[0]["isCurrentMonth"], true);
    assert_eq!(periods[0]["year"], current_period().year);
    assert_eq!(periods[0]["month"], current_period().month);
    assert_eq!(periods[0]["isSubmitted"], false);
}

#[actix_web::test]
async fn test_bulk_medical_leave_links_documents_to_primary_day() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);
    let days = working_days(current_period());

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({
            "files": [{
                "name": "mc.pdf",
                "mimeType": "application/pdf",
                "content": STANDARD.encode(b"%PDF-1.4 certificate")
            }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let uploaded: Value = test::read_body_json(resp).await;
    let documents = uploaded["data"].clone();
    assert_eq!(documents[0]["size"], 20);

    let req = test::TestRequest::post()
        .uri(&month_uri("/bulk"))
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({
            "dates": [days[2], days[0], days[1]],
            "template": { "entryType": "medical_leave" },
            "documentIds": [documents[0]["id"]],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let draft: Value = test::read_body_json(resp).await;
    let pending = draft["data"]["pending"].clone();
    assert_eq!(pending.as_object().unwrap().len(), 3);

    // Nothing is persisted until the overlay is committed.
    let req = test::TestRequest::get()
        .uri(&month_uri(""))
        .insert_header(ctx.bearer(&employee))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["entries"].as_object().unwrap().len(), 0);

    let req = test::TestRequest::post()
        .uri(&month_uri("/entries"))
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({ "changes": pending, "reason": "sick week" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let committed: Value = test::read_body_json(resp).await;

    let entries = committed["data"]["entries"].as_object().unwrap();
    let primary_key = days[0].to_string();
    let primaries: Vec<_> = entries
        .values()
        .filter(|entry| entry["isPrimaryDocument"] == true)
        .collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0]["date"], primary_key);
    for day in &days[1..3] {
        assert_eq!(entries[&day.to_string()]["documentReference"], primary_key);
    }

    let doc_id = documents[0]["id"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{}", doc_id))
        .insert_header(ctx.bearer(&employee))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..], b"%PDF-1.4 certificate");
}

#[actix_web::test]
async fn test_documents_are_private_to_the_timesheet_audience() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);
    let supervisor = person(vec![Role::Supervisor]);
    let stranger = person(vec![Role::Employee]);
    ctx.assign_supervisor(&employee, &supervisor).await;
    ctx.assign_supervisor(&stranger, &supervisor).await;
    let days = working_days(current_period());

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({
            "files": [{
                "name": "referral.pdf",
                "mimeType": "application/pdf",
                "content": STANDARD.encode(b"referral letter")
            }]
        }))
        .to_request();
    let uploaded: Value = test::call_and_read_body_json(&app, req).await;
    let doc_id = uploaded["data"][0]["id"].as_str().unwrap().to_string();
    let doc_uri = format!("/api/v1/documents/{}", doc_id);

    let req = test::TestRequest::get()
        .uri(&doc_uri)
        .insert_header(ctx.bearer(&stranger))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&doc_uri)
        .insert_header(ctx.bearer(&supervisor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Someone else's upload cannot be attached to the stranger's leave.
    let req = test::TestRequest::post()
        .uri(&month_uri("/bulk"))
        .insert_header(ctx.bearer(&stranger))
        .set_json(json!({
            "dates": [days[0]],
            "template": { "entryType": "medical_leave" },
            "documentIds": [doc_id],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_bulk_edit_rejects_unknown_document_ids() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);
    let days = working_days(current_period());
    let made_up = uuid::Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri(&month_uri("/bulk"))
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({
            "dates": [days[0], days[1]],
            "template": { "entryType": "medical_leave" },
            "documentIds": [made_up],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains(&made_up.to_string()));
}

#[actix_web::test]
async fn test_bulk_document_leave_without_files_is_rejected() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);
    let days = working_days(current_period());

    let req = test::TestRequest::post()
        .uri(&month_uri("/bulk"))
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({
            "dates": [days[0], days[1]],
            "template": { "entryType": "hospitalization_leave" },
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_submit_reject_resubmit_over_http() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);
    let supervisor = person(vec![Role::Supervisor]);
    ctx.assign_supervisor(&employee, &supervisor).await;
    let days = working_days(current_period());

    // Submitting an empty month fails the completeness check.
    let req = test::TestRequest::post()
        .uri(&month_uri("/submit"))
        .insert_header(ctx.bearer(&employee))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri(&month_uri("/bulk"))
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({
            "dates": days,
            "template": { "entryType": "working_hours" },
            "presetId": "early",
        }))
        .to_request();
    let draft: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(draft["data"]["completeness"]["filled"], days.len());

    let req = test::TestRequest::post()
        .uri(&month_uri("/entries"))
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({ "changes": draft["data"]["pending"] }))
        .to_request();
    let committed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(committed["data"]["canSubmit"], true);
    assert_eq!(
        committed["data"]["entries"][days[0].to_string()]["startTime"],
        "08:00:00"
    );

    let req = test::TestRequest::post()
        .uri(&month_uri("/submit"))
        .insert_header(ctx.bearer(&employee))
        .to_request();
    let submitted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(submitted["data"]["status"], "submitted");
    assert_eq!(submitted["data"]["version"], 1);
    let timesheet_id = submitted["data"]["id"].as_str().unwrap().to_string();

    // Entries are frozen while submitted.
    let req = test::TestRequest::post()
        .uri(&month_uri("/entries"))
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({ "changes": { days[0].to_string(): null } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let decision_uri = format!("/api/v1/timesheets/{}/decision", timesheet_id);
    let req = test::TestRequest::post()
        .uri(&decision_uri)
        .insert_header(ctx.bearer(&supervisor))
        .set_json(json!({ "decision": "rejected" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&decision_uri)
        .insert_header(ctx.bearer(&employee))
        .set_json(json!({ "decision": "approved" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&decision_uri)
        .insert_header(ctx.bearer(&supervisor))
        .set_json(json!({ "decision": "rejected", "comments": "Please split the client visit" }))
        .to_request();
    let rejected: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rejected["data"]["status"], "rejected");
    assert_eq!(rejected["data"]["approvalComments"], "Please split the client visit");
    assert_eq!(rejected["data"]["canResubmit"], true);

    let req = test::TestRequest::post()
        .uri(&month_uri("/submit"))
        .insert_header(ctx.bearer(&employee))
        .to_request();
    let resubmitted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resubmitted["data"]["status"], "submitted");
    assert_eq!(resubmitted["data"]["version"], 2);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/timesheets/{}/approvals", timesheet_id))
        .insert_header(ctx.bearer(&employee))
        .to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    let records = history["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["action"], "REJECTED");
    assert_eq!(records[0]["actingIdentity"], supervisor.id.to_string());
    assert_eq!(records[0]["version"], 1);
}

#[actix_web::test]
async fn test_strangers_cannot_read_other_timesheets() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);
    let supervisor = person(vec![Role::Supervisor]);
    let stranger = person(vec![Role::Employee]);
    ctx.assign_supervisor(&employee, &supervisor).await;

    let uri = format!("{}?employeeId={}", month_uri(""), employee.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(ctx.bearer(&stranger))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(ctx.bearer(&supervisor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_admin_edit_requires_role_and_reason() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);
    let supervisor = person(vec![Role::Supervisor]);
    let admin = person(vec![Role::Admin]);
    let days = working_days(current_period());
    let period = current_period();
    let uri = format!(
        "/api/v1/admin/timesheets/{}/{}/{}/entries",
        employee.id, period.year, period.month
    );
    let changes = json!({
        days[0].to_string(): { "date": days[0], "entryType": "day_off" }
    });

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.bearer(&supervisor))
        .set_json(json!({ "changes": changes, "editReason": "fix" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.bearer(&admin))
        .set_json(json!({ "changes": changes, "editReason": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(ctx.bearer(&admin))
        .set_json(json!({ "changes": changes, "editReason": "HR confirmed day off" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["editedBy"], admin.id.to_string());
    assert_eq!(body["data"]["editReason"], "HR confirmed day off");
    let timesheet_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/admin/timesheets/{}/audit", timesheet_id))
        .insert_header(ctx.bearer(&admin))
        .to_request();
    let trail: Value = test::call_and_read_body_json(&app, req).await;
    let records = trail["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["changedDates"], json!([days[0]]));
}

#[actix_web::test]
async fn test_presets_are_listed() {
    common::setup_test_env();
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let employee = person(vec![Role::Employee]);

    let req = test::TestRequest::get()
        .uri("/api/v1/presets")
        .insert_header(ctx.bearer(&employee))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let presets = body["data"].as_array().unwrap();
    assert_eq!(presets.len(), 3);
    assert_eq!(presets[0]["id"], "standard");
    assert_eq!(presets[0]["isDefault"], true);
}
