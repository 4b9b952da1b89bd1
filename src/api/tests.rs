use actix_web::{App, http::StatusCode, test, web};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc};

use crate::{config::Config, domain::AppState, routes::Routes, store::memory::MemoryStore};

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

macro_rules! test_app {
    () => {{
        let state = web::Data::new(AppState::new(Arc::new(MemoryStore::default())));
        let routes = Routes::new(&Config::for_tests()).unwrap();
        test::init_service(App::new().app_data(state).configure(|cfg| routes.configure(cfg))).await
    }};
}

/// Sends the request from a fixed peer (the rate limiters key on it) and
/// returns the status with the decoded JSON body.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.peer_addr(peer()).to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        (status, serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null))
    }};
}

macro_rules! register {
    ($app:expr, $name:expr) => {{
        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/student/register")
                .set_json(json!({"name": $name, "latitude": 23.81, "longitude": 90.41}))
        );
        assert_eq!(status, StatusCode::CREATED);
        body["data"].clone()
    }};
}

macro_rules! classroom {
    ($app:expr) => {{
        let (status, body) = send!(
            $app,
            test::TestRequest::post().uri("/api/classrooms").set_json(json!({
                "name": "Distributed Systems",
                "description": "Spring cohort",
                "teacher_name": "Prof. Lamport"
            }))
        );
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_u64().unwrap()
    }};
}

macro_rules! class {
    ($app:expr, $classroom_id:expr, $start:expr) => {{
        let start = $start;
        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri(&format!("/api/classrooms/{}/classes", $classroom_id))
                .set_json(json!({
                    "start_time": start.to_rfc3339(),
                    "end_time": (start + Duration::hours(1)).to_rfc3339(),
                    "link": "https://meet.example.com/abc-defg-hij"
                }))
        );
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_u64().unwrap()
    }};
}

fn join(classroom_id: u64, token: &Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/api/classrooms/{classroom_id}/join"))
        .set_json(json!({ "token": token }))
}

fn mark(token: &Value, class_id: u64, status: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/api/student/{token}/classes/{class_id}/attendance"))
        .set_json(json!({ "checked_in_time": Utc::now().to_rfc3339(), "status": status }))
}

#[actix_web::test]
async fn registration_issues_six_digit_token() {
    let app = test_app!();
    let student = register!(app, "Ada Lovelace");

    let token = student["login_token"].as_u64().unwrap();
    assert!((100_000..=999_999).contains(&token));
    assert_eq!(student["name"], "Ada Lovelace");
    assert_eq!(student["location"], json!({"latitude": 23.81, "longitude": 90.41}));

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/student/user/{token}"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], student["id"]);
}

#[actix_web::test]
async fn blank_name_is_rejected() {
    let app = test_app!();
    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/student/register")
            .set_json(json!({"name": "   "}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[actix_web::test]
async fn joining_twice_conflicts() {
    let app = test_app!();
    let student = register!(app, "Ada Lovelace");
    let classroom_id = classroom!(app);
    class!(app, classroom_id, Utc::now() + Duration::days(1));

    let (status, body) = send!(app, join(classroom_id, &student["login_token"]));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Student enrolled in classroom successfully");

    let (status, body) = send!(app, join(classroom_id, &student["login_token"]));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({"status": "error", "message": "Student already enrolled in this classroom"})
    );

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!(
            "/api/student/{}/classrooms",
            student["login_token"]
        ))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], json!(classroom_id));
}

#[actix_web::test]
async fn enrollment_closes_once_first_class_started() {
    let app = test_app!();
    let student = register!(app, "Ada Lovelace");
    let classroom_id = classroom!(app);
    class!(app, classroom_id, Utc::now() - Duration::hours(2));

    let (status, body) = send!(app, join(classroom_id, &student["login_token"]));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Classes already started. Cannot enroll now.");
}

#[actix_web::test]
async fn joining_unknown_classroom_is_not_found() {
    let app = test_app!();
    let student = register!(app, "Ada Lovelace");

    let (status, body) = send!(app, join(9_999, &student["login_token"]));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Classroom not found");
}

#[actix_web::test]
async fn remarking_replaces_the_earlier_decision() {
    let app = test_app!();
    let student = register!(app, "Ada Lovelace");
    let token = student["login_token"].clone();
    let classroom_id = classroom!(app);
    let class_id = class!(app, classroom_id, Utc::now() + Duration::days(1));
    let (status, _) = send!(app, join(classroom_id, &token));
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send!(app, mark(&token, class_id, "present"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meet_link"], "https://meet.example.com/abc-defg-hij");

    let (status, _) = send!(app, mark(&token, class_id, "absent"));
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/classrooms/{classroom_id}"))
    );
    assert_eq!(status, StatusCode::OK);
    let detail = &body["data"];
    assert_eq!(detail["total_students"], 1);
    assert_eq!(detail["classes_conducted"], 1);
    assert_eq!(
        detail["students"],
        json!([{
            "id": student["id"],
            "name": "Ada Lovelace",
            "total_classes": 1,
            "present_count": 0,
            "absent_count": 1,
            "attendance_percentage": 0.0
        }])
    );

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!(
            "/api/students/{token}/classrooms/{classroom_id}/progress"
        ))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_class_taken"], 1);
    assert_eq!(body["data"]["absent_count"], 1);
    assert!(body["data"]["last_attended"].is_string());
}

#[actix_web::test]
async fn legacy_presence_flag_is_accepted() {
    let app = test_app!();
    let student = register!(app, "Ada Lovelace");
    let token = student["login_token"].clone();
    let classroom_id = classroom!(app);
    let class_id = class!(app, classroom_id, Utc::now() + Duration::days(1));
    send!(app, join(classroom_id, &token));

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/student/{token}/classes/{class_id}/attendance"))
            .set_json(json!({"checked_in_time": "2026-03-02T09:03:00Z", "is_present": true}))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!(
            "/api/classrooms/{classroom_id}/students/{}/attendance",
            student["id"]
        ))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["present_count"], 1);
    assert_eq!(body["data"]["attendance_percentage"], 100.0);
}

#[actix_web::test]
async fn marking_unknown_class_is_not_found() {
    let app = test_app!();
    let student = register!(app, "Ada Lovelace");

    let (status, body) = send!(app, mark(&student["login_token"], 4_242, "present"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Class not found");
}

#[actix_web::test]
async fn student_detail_requires_enrollment() {
    let app = test_app!();
    let student = register!(app, "Ada Lovelace");
    let classroom_id = classroom!(app);

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!(
            "/api/classrooms/{classroom_id}/students/{}/attendance",
            student["id"]
        ))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Student not enrolled in this classroom");
}

#[actix_web::test]
async fn csv_export_matches_detail_roster() {
    let app = test_app!();
    let classroom_id = classroom!(app);
    let class_id = class!(app, classroom_id, Utc::now() + Duration::days(1));

    let ada = register!(app, "Ada Lovelace");
    let grace = register!(app, "Grace Hopper");
    for student in [&ada, &grace] {
        send!(app, join(classroom_id, &student["login_token"]));
    }
    send!(app, mark(&ada["login_token"], class_id, "present"));
    send!(app, mark(&grace["login_token"], class_id, "absent"));

    let (_, body) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/classrooms/{classroom_id}"))
    );
    let roster = body["data"]["students"].as_array().unwrap().clone();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/classrooms/{classroom_id}/export"))
            .peer_addr(peer())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "text/csv");
    assert_eq!(
        resp.headers().get("content-disposition").unwrap(),
        "attachment; filename=attendance_report.csv"
    );
    let csv = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();

    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Student ID,Name,Total Classes,Present Count,Absent Count,Attendance Percentage")
    );
    let rows: Vec<String> = lines.map(str::to_string).collect();
    let expected: Vec<String> = roster
        .iter()
        .map(|s| {
            format!(
                "{},{},{},{},{},{:.2}",
                s["id"],
                s["name"].as_str().unwrap(),
                s["total_classes"],
                s["present_count"],
                s["absent_count"],
                s["attendance_percentage"].as_f64().unwrap()
            )
        })
        .collect();
    assert_eq!(rows, expected);
    assert_eq!(rows.len(), 2);
}

#[actix_web::test]
async fn class_times_must_be_ordered() {
    let app = test_app!();
    let classroom_id = classroom!(app);

    for (start, end) in [
        ("2026-03-02T09:00:00Z", "2026-03-02T08:00:00Z"),
        ("2026-03-02T09:00:00Z", "2026-03-02T09:00:00Z"),
    ] {
        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri(&format!("/api/classrooms/{classroom_id}/classes"))
                .set_json(json!({"start_time": start, "end_time": end, "link": "https://meet.example.com/x"}))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid end_time. It must be after start_time");
    }

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/classrooms/{classroom_id}/classes"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"classroom_id": classroom_id, "classes": []}));
}

#[actix_web::test]
async fn class_in_unknown_classroom_is_not_found() {
    let app = test_app!();
    let (status, _) = send!(
        app,
        test::TestRequest::post().uri("/api/classrooms/77/classes").set_json(json!({
            "start_time": "2026-03-02T09:00:00Z",
            "end_time": "2026-03-02T10:00:00Z",
            "link": "https://meet.example.com/x"
        }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_input_gets_error_envelope() {
    let app = test_app!();

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/api/student/user/12")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "Invalid token format"}));

    let (status, body) = send!(
        app,
        test::TestRequest::get().uri("/api/classrooms/abc")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/classrooms")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"name\": ")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "Invalid request payload"}));
}

#[actix_web::test]
async fn unknown_classroom_detail_is_not_found() {
    let app = test_app!();
    let (status, body) = send!(app, test::TestRequest::get().uri("/api/classrooms/5"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Classroom not found");
}

#[actix_web::test]
async fn health_pings_the_store() {
    let app = test_app!();
    let (status, body) = send!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": "ok"}));
}
