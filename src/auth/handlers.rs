use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{field, warn, Span};

use crate::{
    auth::{
        dto::{ApiResponse, LoginRequest, RegisterRequest, TokenPair},
        error::ApiError,
    },
    middleware::{response_time, ResponseTime},
    state::AppState,
    telemetry::{observe, op_span},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    warn!(reason = %rejection.body_text(), "rejected request body");
    ApiError::InvalidRequest("Bad request body".into())
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(register).layer(from_fn_with_state(
                ResponseTime::histogram("register"),
                response_time,
            )),
        )
        .route(
            "/login",
            post(login).layer(from_fn_with_state(
                ResponseTime::histogram("login"),
                response_time,
            )),
        )
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    let span = op_span!(
        "controller.RegisterUser",
        email = field::Empty,
        full_name = field::Empty
    );
    observe(span, "User registered successfully", async move {
        let Json(payload) = payload.map_err(bad_body)?;
        let span = Span::current();
        span.record("email", payload.email.as_str());
        span.record("full_name", payload.full_name.as_str());

        if payload.full_name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("Full name is required".into()));
        }
        if !is_valid_email(&payload.email) {
            return Err(ApiError::InvalidRequest("Invalid email".into()));
        }
        state
            .auth
            .register(&payload.full_name, &payload.email, &payload.password)
            .await?;
        Ok((
            StatusCode::CREATED,
            Json(ApiResponse::ok(
                "User registered successfully",
                StatusCode::CREATED,
                None,
            )),
        ))
    })
    .await
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let span = op_span!("controller.LoginUser", email = field::Empty);
    observe(span, "User logged in successfully", async move {
        let Json(payload) = payload.map_err(bad_body)?;
        Span::current().record("email", payload.email.as_str());

        if !is_valid_email(&payload.email) {
            return Err(ApiError::InvalidRequest("Invalid email".into()));
        }
        let tokens = state.auth.login(&payload.email, &payload.password).await?;
        Ok(Json(ApiResponse::ok(
            "User logged in successfully",
            StatusCode::OK,
            Some(tokens),
        )))
    })
    .await
}
