//! 认证相关的 HTTP 处理器
//!
//! 提供注册、登录、个人资料与修改密码的 API

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use pods_orders::{OrderError, User, UserId, UserProfile, UserRole};
use tracing::{info, instrument};
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    UpdateProfileRequest, UserResponse,
};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 用户注册
///
/// POST /api/auth/register
#[instrument(skip_all, fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    if state.repos.users.find_by_email(&req.email).await?.is_some() {
        return Err(OrderError::EmailAlreadyRegistered.into());
    }

    let user = User {
        id: UserId::new(state.id_gen.generate("user")),
        name: req.name,
        email: req.email,
        password_hash: hash_password(&req.password)?,
        role: UserRole::Customer,
        created_at: Utc::now(),
    };
    state.repos.users.insert(&user).await?;
    info!(user_id = %user.id, "新用户已注册");

    let token = state.jwt_manager.generate_token(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserProfile::from(&user),
            token,
        }),
    ))
}

/// 用户登录
///
/// POST /api/auth/login
#[instrument(skip_all, fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    req.validate()?;

    // 用户不存在与密码错误返回相同提示
    let user = state
        .repos
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(OrderError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(OrderError::InvalidCredentials.into());
    }

    let token = state.jwt_manager.generate_token(&user)?;
    Ok(Json(AuthResponse {
        user: UserProfile::from(&user),
        token,
    }))
}

/// 当前用户资料
///
/// GET /api/auth/profile
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse { user })
}

/// 更新姓名 / 邮箱
///
/// PUT /api/auth/profile
#[instrument(skip_all, fields(user_id = %current.0.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let id = &current.0.id;
    let user = state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| OrderError::UserNotFound(id.to_string()))?;

    let name = req.name().unwrap_or(&user.name);
    let email = req.email().unwrap_or(&user.email);

    if email != user.email {
        let taken = state
            .repos
            .users
            .find_by_email(email)
            .await?
            .is_some_and(|other| other.id != user.id);
        if taken {
            return Err(OrderError::EmailInUse.into());
        }
    }

    state.repos.users.update_profile(id, name, email).await?;

    let updated = state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| OrderError::UserNotFound(id.to_string()))?;

    Ok(Json(UserResponse {
        user: UserProfile::from(&updated),
    }))
}

/// 修改密码
///
/// PUT /api/auth/password
#[instrument(skip_all, fields(user_id = %current.0.id))]
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;

    let id = &current.0.id;
    let user = state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| OrderError::UserNotFound(id.to_string()))?;

    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(OrderError::WrongPassword.into());
    }

    let hashed = hash_password(&req.new_password)?;
    state.repos.users.update_password(id, &hashed).await?;
    info!("密码已修改");

    Ok(Json(MessageResponse::new("Senha alterada com sucesso")))
}
