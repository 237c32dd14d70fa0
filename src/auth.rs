//! 认证模块
//!
//! 登录/注销流程，是除请求管道外唯一写入会话的地方。
//! 凭据校验和令牌签发由后端完成，这里只负责保存结果。

use crate::pipeline::{RequestFailure, RequestPipeline};
use crate::request::HttpClient;
use crate::session::{SessionStore, StorageError};
use hospital_shared::{ApiCall, LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use thiserror::Error;
use tracing::info;

const LOGIN_PATH: &str = "/api/user/login";
const REGISTER_PATH: &str = "/api/user/register";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Request(#[from] RequestFailure),
    /// 登录成功但会话无法保存
    #[error("会话保存失败: {0}")]
    Storage(#[from] StorageError),
}

/// 登录并保存会话
///
/// 成功后令牌与用户资料整体替换旧会话；失败时旧会话保持不变。
pub async fn login<C: HttpClient>(
    pipeline: &RequestPipeline<C>,
    credentials: &LoginRequest,
) -> Result<UserProfile, AuthError> {
    let body = serde_json::to_value(credentials).map_err(RequestFailure::from)?;
    let response: LoginResponse = pipeline
        .dispatch(ApiCall::post(LOGIN_PATH).with_body(body))
        .await?;

    let (token, profile) = response.into_session_parts();
    pipeline.session().set_session(&token, &profile)?;

    info!(user = %profile.username, role = %profile.role, "logged in");
    Ok(profile)
}

/// 注销并清除会话
///
/// 导航由路由服务的 `revalidate` 处理。
pub fn logout(session: &SessionStore) -> Result<(), StorageError> {
    session.clear_session()?;
    info!("logged out");
    Ok(())
}

/// 患者注册，不会建立会话
pub async fn register_patient<C: HttpClient>(
    pipeline: &RequestPipeline<C>,
    request: &RegisterRequest,
) -> Result<(), RequestFailure> {
    let body = serde_json::to_value(request)?;
    pipeline
        .dispatch(ApiCall::post(REGISTER_PATH).with_body(body))
        .await
}
