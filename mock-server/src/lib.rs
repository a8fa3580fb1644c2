use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// Body accepted by create and replace. Every field is required; they are
/// optional here so a missing one yields the API's own 400 message instead
/// of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct TodoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Default)]
pub struct Todos {
    rows: BTreeMap<i64, Todo>,
    last_id: i64,
}

pub type Db = Arc<RwLock<Todos>>;

/// A handler failure rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Todo not found".to_string(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

struct ValidInput {
    title: String,
    description: String,
    completed: bool,
}

impl TodoInput {
    fn validate(self) -> Result<ValidInput, ApiError> {
        let (Some(title), Some(description), Some(completed)) =
            (self.title, self.description, self.completed)
        else {
            return Err(ApiError::bad_request("Missing required fields"));
        };
        check_length("title", &title, TITLE_MAX_LEN)?;
        check_length("description", &description, DESCRIPTION_MAX_LEN)?;
        Ok(ValidInput {
            title,
            description,
            completed,
        })
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(ApiError::bad_request(format!(
            "{field} must be between 1 and {max} characters"
        )));
    }
    Ok(())
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Todos::default()));
    Router::new()
        .route("/", get(hello))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "serving todos");
    }
    axum::serve(listener, app()).await
}

async fn hello() -> Json<&'static str> {
    Json("Hello, cross-origin-world!")
}

/// Newest first.
async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    let todos = db.read().await;
    Json(todos.rows.values().rev().cloned().collect())
}

/// Unreadable bodies get the same `{"error": ...}` 400 as invalid ones.
fn read_input(payload: Result<Json<TodoInput>, JsonRejection>) -> Result<ValidInput, ApiError> {
    let Json(input) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    input.validate()
}

async fn create_todo(
    State(db): State<Db>,
    payload: Result<Json<TodoInput>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let input = read_input(payload)?;
    let mut todos = db.write().await;
    todos.last_id += 1;
    let todo = Todo {
        id: todos.last_id,
        title: input.title,
        description: input.description,
        completed: input.completed,
    };
    todos.rows.insert(todo.id, todo.clone());
    debug!(id = todo.id, "created todo");
    Ok(Json(todo))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Todo>, ApiError> {
    let todos = db.read().await;
    todos.rows.get(&id).cloned().map(Json).ok_or_else(ApiError::not_found)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    payload: Result<Json<TodoInput>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let mut todos = db.write().await;
    let todo = todos.rows.get_mut(&id).ok_or_else(ApiError::not_found)?;
    let input = read_input(payload)?;
    todo.title = input.title;
    todo.description = input.description;
    todo.completed = input.completed;
    debug!(id, "updated todo");
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Todo>, ApiError> {
    let mut todos = db.write().await;
    let todo = todos.rows.remove(&id).ok_or_else(ApiError::not_found)?;
    debug!(id, "deleted todo");
    Ok(Json(todo))
}
