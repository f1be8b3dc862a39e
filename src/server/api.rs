//! REST handlers for teams, users and pull requests.

use crate::error::AppError;
use crate::models::{NewPullRequest, ReassignOutcome, TeamMember, TeamWithMembers, UserReviews};
use crate::server::auth::AuthUser;
use crate::server::AppState;
use crate::services::{pull_requests, teams, users};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    code: &'static str,
    message: String,
}

/// `{"error": {"code", "message"}}`
#[derive(Serialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(pub AppError);

impl ApiErr {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::UserNotFound { .. }
            | AppError::PrNotFound { .. }
            | AppError::TeamNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::PrAlreadyExists { .. }
            | AppError::PrMerged { .. }
            | AppError::ReviewerNotAssigned { .. }
            | AppError::NoCandidateAvailable { .. }
            | AppError::TeamAlreadyExists { .. }
            | AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_internal() {
            log::error!("[server] {}", self.0);
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = ApiErrorEnvelope {
            error: ApiErrorBody {
                code: self.0.code(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Unwrap a JSON body, turning malformed or incomplete payloads into 400s.
pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiErr> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiErr(AppError::invalid_input_field(rejection.body_text(), "body")))
}

/// Reject empty or whitespace-only required fields.
pub(crate) fn require(value: &str, field: &str) -> Result<(), ApiErr> {
    if value.trim().is_empty() {
        return Err(ApiErr(AppError::invalid_input_field(
            format!("{} is required", field),
            field,
        )));
    }
    Ok(())
}

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddTeamRequest {
    team_name: String,
    members: Vec<TeamMember>,
}

#[derive(Deserialize)]
pub struct TeamQuery {
    #[serde(default)]
    team_name: String,
}

#[derive(Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    user_id: String,
}

#[derive(Deserialize)]
pub struct SetIsActiveRequest {
    user_id: String,
    is_active: bool,
}

#[derive(Deserialize)]
pub struct MergeRequest {
    pull_request_id: String,
}

#[derive(Deserialize)]
pub struct ReassignRequest {
    pull_request_id: String,
    old_reviewer_id: String,
}

// ── Teams ────────────────────────────────────────────────────────────────────

pub async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<AddTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiErr> {
    let req = parse_body(payload)?;
    require(&req.team_name, "team_name")?;

    let team = teams::create_team(&state.db, &req.team_name, req.members).await?;

    Ok((StatusCode::CREATED, Json(json!({ "team": team }))))
}

pub async fn get_team(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<TeamWithMembers>, ApiErr> {
    require(&query.team_name, "team_name")?;
    let team = teams::get_team(&state.db, &query.team_name).await?;
    Ok(Json(team))
}

// ── Users ────────────────────────────────────────────────────────────────────

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, ApiErr> {
    let users = users::list_users(&state.db).await?;
    Ok(Json(json!({ "users": users })))
}

pub async fn set_is_active(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiErr> {
    caller.require_admin()?;
    let req = parse_body(payload)?;
    require(&req.user_id, "user_id")?;

    let user = users::set_is_active(&state.db, &req.user_id, req.is_active).await?;

    Ok(Json(json!({ "user": user })))
}

pub async fn get_review(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserReviews>, ApiErr> {
    require(&query.user_id, "user_id")?;
    let reviews = users::get_review_assignments(&state.db, &query.user_id).await?;
    Ok(Json(reviews))
}

// ── Pull requests ────────────────────────────────────────────────────────────

pub async fn create_pull_request(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<NewPullRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiErr> {
    caller.require_admin()?;
    let req = parse_body(payload)?;
    require(&req.pull_request_id, "pull_request_id")?;
    require(&req.pull_request_name, "pull_request_name")?;
    require(&req.author_id, "author_id")?;

    let pr = pull_requests::create_pull_request(&state.db, req).await?;

    Ok((StatusCode::CREATED, Json(json!({ "pull_request": pr }))))
}

pub async fn merge_pull_request(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiErr> {
    caller.require_admin()?;
    let req = parse_body(payload)?;
    require(&req.pull_request_id, "pull_request_id")?;

    let pr = pull_requests::merge_pull_request(&state.db, &req.pull_request_id).await?;

    Ok(Json(json!({ "pull_request": pr })))
}

pub async fn reassign_reviewer(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignOutcome>, ApiErr> {
    caller.require_admin()?;
    let req = parse_body(payload)?;
    require(&req.pull_request_id, "pull_request_id")?;
    require(&req.old_reviewer_id, "old_reviewer_id")?;

    let outcome =
        pull_requests::reassign_reviewer(&state.db, &req.pull_request_id, &req.old_reviewer_id)
            .await?;

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = ApiErr(err).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn engine_errors_map_to_status_and_code() {
        let (status, body) = body_of(AppError::no_candidate("pr-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "NO_CANDIDATE");
        assert_eq!(body["error"]["message"], "no active replacement candidate in team");

        let (status, body) = body_of(AppError::pr_not_found("pr-1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = body_of(AppError::pr_already_exists("pr-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_of(AppError::database("disk I/O error at /var/db")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "internal server error");
    }

    #[test]
    fn require_rejects_blank_values() {
        assert!(require("pr-1", "pull_request_id").is_ok());
        assert!(require("   ", "pull_request_id").is_err());
    }
}
