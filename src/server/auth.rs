//! Bearer-token middleware and the token endpoints.

use crate::error::AppError;
use crate::models::{LoginResponse, Role, TokenPair};
use crate::server::api::{parse_body, require, ApiErr};
use crate::server::AppState;
use crate::services::auth;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

/// Authenticated caller, inserted as a request extension by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiErr> {
        if self.role != Role::Admin {
            log::warn!("[auth] {} lacks admin role", self.user_id);
            return Err(ApiErr(AppError::Forbidden));
        }
        Ok(())
    }
}

/// axum middleware that checks the `Authorization: Bearer` header.
///
/// Lets the request through with an [`AuthUser`] extension if the access
/// token verifies. Returns 401 JSON otherwise.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        log::warn!("[auth] Missing bearer token for {}", request.uri().path());
        return ApiErr(AppError::authentication("Auth token required")).into_response();
    };

    match auth::verify_access_token(&state.auth, token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser {
                user_id: claims.id,
                role: claims.role,
            });
            next.run(request).await
        }
        Err(err) => {
            log::warn!("[auth] Rejected token for {}: {}", request.uri().path(), err);
            ApiErr(err).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    user_id: String,
    #[serde(default)]
    is_admin: bool,
}

/// `POST /auth/admin`: set the caller's role and issue tokens.
pub async fn admin_login_handler(
    State(state): State<AppState>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiErr> {
    let req = parse_body(payload)?;
    require(&req.user_id, "user_id")?;

    let login = auth::login_as(&state.db, &state.auth, &req.user_id, req.is_admin).await?;

    Ok(Json(login))
}

/// `POST /auth/refresh`: new access token for the bearer's stored session.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<TokenPair>, ApiErr> {
    let pair = auth::refresh(&state.db, &state.auth, &caller.user_id).await?;
    Ok(Json(pair))
}
