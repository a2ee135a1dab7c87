//! Tests of the REST client, against a throw-away local server

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::http::header::AUTHORIZATION;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use todo_agenda::calendar::parse_local_date;
use todo_agenda::client::Client;
use todo_agenda::error::AgendaError;
use todo_agenda::todo::{Priority, TodoDraft};
use todo_agenda::traits::{TagSource, TodoSource};

const TOKEN: &str = "s3cr3t";

/// Everything the server has been asked
#[derive(Clone, Default)]
struct ServerLog(Arc<Mutex<Vec<String>>>);

impl ServerLog {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn bearer(headers: &HeaderMap) -> String {
    headers.get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn sample_todo(id: i64, due_date: &str) -> Value {
    json!({
        "id": id,
        "title": "Standup",
        "description": "Daily meeting",
        "completed": false,
        "dueDate": due_date,
        "dueTime": "09:30:00",
        "priority": "LOW",
        "displayOrder": 0,
        "parentId": null,
        "tags": [{"id": 3, "name": "work", "color": "#ff8800"}],
        "subtasks": [],
        "createdAt": "2024-03-01T08:00:00",
        "updatedAt": "2024-03-01T08:00:00"
    })
}

async fn week(State(log): State<ServerLog>, headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    log.push(format!("GET week start={} auth={}", params.get("start").cloned().unwrap_or_default(), bearer(&headers)));
    Json(json!([sample_todo(1, "2024-03-11")]))
}

async fn calendar_counts(State(log): State<ServerLog>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    log.push(format!("GET counts year={} month={}", params["year"], params["month"]));
    Json(json!({"2024-03-11": 2, "2024-03-15": 1}))
}

async fn create(State(log): State<ServerLog>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    log.push(format!("POST todos title={} dueDate={} priority={} tagIds={}", body["title"], body["dueDate"], body["priority"], body["tagIds"]));
    let mut created = sample_todo(12, "2024-03-20");
    created["title"] = body["title"].clone();
    (StatusCode::CREATED, Json(created))
}

async fn reorder(State(log): State<ServerLog>, Json(ids): Json<Vec<i64>>) -> StatusCode {
    log.push(format!("PUT reorder {:?}", ids));
    StatusCode::OK
}

async fn move_todo(State(log): State<ServerLog>, Path(id): Path<i64>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let due_date = params.get("dueDate").cloned().unwrap_or_default();
    log.push(format!("PATCH {} dueDate={}", id, due_date));
    Json(sample_todo(id, &due_date))
}

async fn delete_todo(State(log): State<ServerLog>, Path(id): Path<i64>) -> StatusCode {
    log.push(format!("DELETE {}", id));
    StatusCode::NOT_FOUND
}

async fn tags(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if bearer(&headers) != format!("Bearer {}", TOKEN) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!([{"id": 1, "name": "home", "color": "#00ff00"}])))
}

/// Start a server on a random port, and return its base URL
async fn start_server(log: ServerLog) -> String {
    let app = Router::new()
        .route("/api/todos", post(create))
        .route("/api/todos/week", get(week))
        .route("/api/todos/calendar-counts", get(calendar_counts))
        .route("/api/todos/reorder", put(reorder))
        .route("/api/todos/:id/due-date", patch(move_todo))
        .route("/api/todos/:id", delete(delete_todo))
        .route("/api/tags", get(tags))
        .with_state(log);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

fn date(s: &str) -> NaiveDate {
    parse_local_date(s).unwrap()
}


#[tokio::test]
async fn test_queries() {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = ServerLog::default();
    let url = start_server(log.clone()).await;
    let client = Client::new(&url, Some(TOKEN.to_string())).unwrap();

    let todos = client.get_todos_by_week(date("2024-03-10")).await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].due_date(), Some(date("2024-03-11")));
    assert_eq!(todos[0].priority(), Priority::Low);
    assert_eq!(todos[0].tags()[0].name(), "work");

    let counts = client.get_calendar_counts(2024, 3).await.unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[&date("2024-03-11")], 2);

    assert_eq!(log.entries(), vec![
        format!("GET week start=2024-03-10 auth=Bearer {}", TOKEN),
        "GET counts year=2024 month=3".to_string(),
    ]);
}

#[tokio::test]
async fn test_mutations() {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = ServerLog::default();
    let url = start_server(log.clone()).await;
    let mut client = Client::new(&url, Some(TOKEN.to_string())).unwrap();

    let created = client.create_todo(
        TodoDraft::new("Buy milk").due_on(date("2024-03-20")).with_priority(Priority::High).with_tags(vec![3])
    ).await.unwrap();
    assert_eq!(created.id(), 12);
    assert_eq!(created.title(), "Buy milk");

    client.reorder_todos(&[2, 3, 1]).await.unwrap();

    let moved = client.move_todo(7, date("2024-03-20")).await.unwrap();
    assert_eq!(moved.due_date(), Some(date("2024-03-20")));

    assert_eq!(log.entries(), vec![
        r#"POST todos title="Buy milk" dueDate="2024-03-20" priority="HIGH" tagIds=[3]"#.to_string(),
        "PUT reorder [2, 3, 1]".to_string(),
        "PATCH 7 dueDate=2024-03-20".to_string(),
    ]);
}

#[tokio::test]
async fn test_errors() {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = ServerLog::default();
    let url = start_server(log.clone()).await;

    let mut client = Client::new(&url, Some(TOKEN.to_string())).unwrap();
    let err = client.delete_todo(5).await.unwrap_err();
    let agenda_error = err.downcast_ref::<AgendaError>().unwrap();
    assert_eq!(agenda_error.status().map(|status| status.as_u16()), Some(404));
    assert!(err.to_string().contains("/api/todos/5"));

    // No retry
    assert_eq!(log.entries(), vec!["DELETE 5".to_string()]);

    let authenticated = client.get_tags().await.unwrap();
    assert_eq!(authenticated[0].name(), "home");

    let anonymous = Client::new(&url, None).unwrap();
    let err = anonymous.get_tags().await.unwrap_err();
    assert_eq!(err.downcast_ref::<AgendaError>().and_then(|e| e.status()).map(|status| status.as_u16()), Some(401));

    // Nothing listens there
    let unreachable = Client::new("http://127.0.0.1:1/api", None).unwrap();
    assert!(unreachable.get_todos().await.is_err());
}
