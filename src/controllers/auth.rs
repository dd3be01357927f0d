use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, verify_password, LoginFlow, LoginStep};
use crate::config::AppConfig;
use crate::database::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/signout", post(signout))
        .route("/auth/profile", get(profile))
        .route("/auth/phone/start", post(phone_start))
        .route("/auth/phone/verify", post(phone_verify))
        .route("/auth/phone/complete", post(phone_complete))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

fn issue_token(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let (token, claims) = state.tokens.issue(user.id, user.email.clone(), user.is_admin)?;
    let expires_at = DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| AppError::Internal(format!("bad token expiry {}", claims.exp)))?;
    Ok(AuthResponse { token, expires_at, user })
}

// Права только добавляются: снять админа можно лишь в БД
fn should_promote(app: &AppConfig, user: &User) -> bool {
    !user.is_admin && user.email.as_deref().is_some_and(|email| app.is_admin_email(email))
}

async fn apply_admin_role(state: &AppState, user: User) -> AppResult<User> {
    if !should_promote(&state.config.app, &user) {
        return Ok(user);
    }
    let user = User::grant_admin(&state.db, user.id).await?;
    tracing::info!(user_id = %user.id, "admin role granted from ADMIN_EMAILS");
    Ok(user)
}

/* ---------- EMAIL + PASSWORD ---------- */

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
}

// POST /api/auth/signup
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_password(req.password).await?;
    let user = User::create_with_password(&state.db, &req.email, &req.full_name, &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email is already registered".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

    let user = apply_admin_role(&state, user).await?;
    tracing::info!(user_id = %user.id, "user signed up");
    Ok((StatusCode::CREATED, Json(issue_token(&state, user)?)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

// POST /api/auth/signin
async fn signin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SigninRequest>,
) -> AppResult<impl IntoResponse> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email).await?.ok_or_else(invalid)?;
    // У пользователей, вошедших по телефону, пароля нет
    let hash = user.password_hash.clone().ok_or_else(invalid)?;
    if !verify_password(req.password, hash).await {
        return Err(invalid());
    }

    let user = apply_admin_role(&state, user).await?;
    tracing::info!(user_id = %user.id, "user signed in");
    Ok(Json(issue_token(&state, user)?))
}

// POST /api/auth/signout
async fn signout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    state
        .cache
        .revoke_token(user.claims.jti, user.claims.remaining_secs())
        .await?;
    tracing::info!(user_id = %user.user_id, "user signed out");
    Ok(Json(serde_json::json!({ "success": true, "message": "Signed out" })))
}

// GET /api/auth/profile
async fn profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let profile = User::find(&state.db, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(profile))
}

/* ---------- PHONE (mock OTP) ---------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResponse {
    pub flow_id: Uuid,
    pub step: LoginStep,
    pub phone: String,
}

fn flow_response(flow_id: Uuid, flow: &LoginFlow) -> FlowResponse {
    FlowResponse {
        flow_id,
        step: flow.step(),
        phone: flow.phone().to_string(),
    }
}

async fn load_flow(state: &AppState, flow_id: Uuid) -> AppResult<LoginFlow> {
    state
        .cache
        .load_login_flow(flow_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Login flow expired or not found".to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneStartRequest {
    pub phone: String,
}

// POST /api/auth/phone/start
async fn phone_start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PhoneStartRequest>,
) -> AppResult<impl IntoResponse> {
    let mut flow = LoginFlow::new();
    flow.submit_phone_number(&req.phone)?;

    let flow_id = Uuid::new_v4();
    state.cache.save_login_flow(flow_id, &flow).await?;
    tracing::debug!(%flow_id, "phone login started");
    Ok((StatusCode::CREATED, Json(flow_response(flow_id, &flow))))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneVerifyRequest {
    pub flow_id: Uuid,
    pub code: String,
}

// POST /api/auth/phone/verify
async fn phone_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PhoneVerifyRequest>,
) -> AppResult<impl IntoResponse> {
    let mut flow = load_flow(&state, req.flow_id).await?;
    flow.verify_code(&req.code)?;
    state.cache.save_login_flow(req.flow_id, &flow).await?;
    Ok(Json(flow_response(req.flow_id, &flow)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneCompleteRequest {
    pub flow_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
}

// POST /api/auth/phone/complete
async fn phone_complete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PhoneCompleteRequest>,
) -> AppResult<impl IntoResponse> {
    let mut flow = load_flow(&state, req.flow_id).await?;
    let profile = flow.complete_profile(&req.full_name, req.email.as_deref())?;

    let user = User::upsert_phone_user(&state.db, &profile.phone, &profile.full_name, profile.email.as_deref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email is already used by another account".to_string())
            } else {
                AppError::Database(e)
            }
        })?;
    state.cache.delete_login_flow(req.flow_id).await?;
    let user = apply_admin_role(&state, user).await?;

    tracing::info!(user_id = %user.id, "phone login completed");
    Ok(Json(issue_token(&state, user)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    fn app(admins: &[&str]) -> AppConfig {
        AppConfig {
            host: "0.0.0.0".into(),
            port: 8000,
            environment: "test".into(),
            rust_log: "info".into(),
            log_format: LogFormat::Pretty,
            cors_origins: vec!["*".into()],
            admin_emails: admins.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn user(email: Option<&str>, is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            phone_number: None,
            full_name: "Asha Rao".into(),
            password_hash: None,
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_listed_email_is_promoted() {
        let app = app(&["ops@showsphere.in"]);
        assert!(should_promote(&app, &user(Some("Ops@ShowSphere.in"), false)));
        assert!(!should_promote(&app, &user(Some("ops@showsphere.in"), true)));
        assert!(!should_promote(&app, &user(Some("guest@example.com"), false)));
        assert!(!should_promote(&app, &user(None, false)));
    }

    #[test]
    fn test_no_admins_configured() {
        assert!(!should_promote(&app(&[]), &user(Some("ops@showsphere.in"), false)));
    }
}
