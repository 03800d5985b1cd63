use axum::{
    Extension, Form, Json,
    extract::Path,
    http::StatusCode,
    response::{Html, Redirect},
};
use serde::Deserialize;
use taskboard_core::TaskBoard;
use taskboard_core::domain::{TaskField, TaskId};
use taskboard_core::observability::BoardStatus;

use crate::error::AppError;
use crate::page;

#[derive(Debug, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

fn back_to_board() -> Redirect {
    Redirect::to("/")
}

pub async fn index_handler(Extension(board): Extension<TaskBoard>) -> Html<String> {
    board.show().await;
    let snapshot = board.snapshot().await;
    Html(page::render_board(&snapshot))
}

pub async fn create_handler(
    Extension(board): Extension<TaskBoard>,
    Form(form): Form<TaskForm>,
) -> Redirect {
    board.set_draft_field(TaskField::Title, form.title).await;
    board
        .set_draft_field(TaskField::Description, form.description)
        .await;
    board.create().await;
    back_to_board()
}

pub async fn request_edit_handler(
    Extension(board): Extension<TaskBoard>,
    Path(id): Path<TaskId>,
) -> Result<Redirect, AppError> {
    let task = board
        .snapshot()
        .await
        .find(id)
        .cloned()
        .ok_or(AppError::TaskNotFound(id))?;
    board.request_edit(task).await;
    Ok(back_to_board())
}

pub async fn save_edit_handler(
    Extension(board): Extension<TaskBoard>,
    Form(form): Form<TaskForm>,
) -> Redirect {
    board.set_edit_field(TaskField::Title, form.title).await;
    board
        .set_edit_field(TaskField::Description, form.description)
        .await;
    board.save_edit().await;
    back_to_board()
}

pub async fn cancel_edit_handler(Extension(board): Extension<TaskBoard>) -> Redirect {
    board.cancel_edit().await;
    back_to_board()
}

pub async fn delete_handler(
    Extension(board): Extension<TaskBoard>,
    Path(id): Path<TaskId>,
) -> Redirect {
    board.delete(id).await;
    back_to_board()
}

pub async fn status_handler(Extension(board): Extension<TaskBoard>) -> Json<BoardStatus> {
    Json(board.status().await)
}

pub async fn admin_handler() -> Html<String> {
    Html(page::render_message("Admin", "Signed in."))
}

pub async fn login_handler() -> Html<String> {
    Html(page::render_message("Login", "Sign in to continue."))
}

pub async fn not_found_handler() -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(page::render_message("Not found", "No such page.")),
    )
}
