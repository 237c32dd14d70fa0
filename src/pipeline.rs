//! 请求管道
//!
//! 所有出站请求都经过这里：
//! 1. 出站阶段：读取会话，存在令牌时附加身份请求头；
//! 2. 入站阶段：把传输错误、无法解析的响应、非成功业务码统一归一为 `RequestFailure`，
//!    成功时只把信封里的 `data` 交给调用方。
//!
//! 失败会被记录日志，但总是返回给调用方；不做任何重试。

use crate::config::ClientConfig;
use crate::request::{HttpClient, HttpRequest, HttpResponse, TransportError};
use crate::session::SessionStore;
use hospital_shared::{ApiCall, ResponseEnvelope};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

// =========================================================
// 失败类型 (Failure Taxonomy)
// =========================================================

/// 请求失败的唯一形态，携带可直接展示给用户的消息
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    /// 网络错误、超时、非 2xx 状态码或无法解析的响应体
    #[error("{message}")]
    Transport { message: String },
    /// 信封格式正确，但业务码不是成功码
    #[error("{message}")]
    Application { code: i32, message: String },
    /// 令牌无效或过期；产生时会话已被清除
    #[error("{message}")]
    AuthenticationRejected { code: i32, message: String },
}

impl RequestFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Application { message, .. }
            | Self::AuthenticationRejected { message, .. } => message,
        }
    }

    /// 业务码，传输层失败没有业务码
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Transport { .. } => None,
            Self::Application { code, .. } | Self::AuthenticationRejected { code, .. } => {
                Some(*code)
            }
        }
    }

    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::AuthenticationRejected { .. })
    }
}

impl From<TransportError> for RequestFailure {
    fn from(e: TransportError) -> Self {
        Self::transport(e.to_string())
    }
}

impl From<serde_json::Error> for RequestFailure {
    fn from(e: serde_json::Error) -> Self {
        Self::transport(format!("数据格式错误: {e}"))
    }
}

pub type RequestResult<T> = Result<T, RequestFailure>;

// =========================================================
// 管道 (Pipeline)
// =========================================================

pub struct RequestPipeline<C: HttpClient> {
    client: C,
    session: SessionStore,
    config: ClientConfig,
}

impl<C: HttpClient> RequestPipeline<C> {
    pub fn new(client: C, session: SessionStore, config: ClientConfig) -> Self {
        Self {
            client,
            session,
            config,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 发送请求并把成功信封中的 `data` 反序列化为 `T`
    ///
    /// 缺失的 `data` 按 JSON `null` 处理，因此 `T` 可以是 `()` 或 `Option<_>`。
    pub async fn dispatch<T: DeserializeOwned>(&self, call: ApiCall) -> RequestResult<T> {
        let data = self.dispatch_value(call).await?;
        serde_json::from_value(data).map_err(|e| {
            let failure = RequestFailure::from(e);
            error!(error = %failure, "response data does not match the expected shape");
            failure
        })
    }

    /// 与 `dispatch` 相同，但返回未经类型化的 `data`
    pub async fn dispatch_value(&self, call: ApiCall) -> RequestResult<Value> {
        let method = call.method;
        let path = call.path.clone();
        let (request, sent_token) = self.outbound(call);

        debug!(method = method.as_str(), %path, "dispatching request");
        let outcome = self.client.send(request).await;

        let result = self.inbound(outcome, sent_token.as_deref());
        if let Err(failure) = &result {
            error!(method = method.as_str(), %path, error = %failure, "request failed");
        }
        result
    }

    /// 出站阶段：拼接 URL 与查询参数，按会话附加令牌
    ///
    /// 同时返回实际附加的令牌，入站阶段据此判断令牌失效是否仍针对当前会话。
    fn outbound(&self, call: ApiCall) -> (HttpRequest, Option<String>) {
        let mut url = self.config.url(&call.path);
        if !call.query.is_empty() {
            let query = call
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        let mut request = HttpRequest::new(&url, call.method);
        if let Some(body) = call.body {
            request = request.with_body(body);
        }

        // 每次请求都重新读取会话，注销后发出的请求不会携带旧令牌
        let token = self.session.token();
        if let Some(token) = &token {
            request = request.with_header(&self.config.token_header, token);
        }
        (request, token)
    }

    /// 入站阶段：统一归一化
    fn inbound(
        &self,
        outcome: Result<HttpResponse, TransportError>,
        sent_token: Option<&str>,
    ) -> RequestResult<Value> {
        let response = outcome?;

        if !response.is_success() {
            return Err(RequestFailure::transport(format!(
                "请求失败，状态码: {}",
                response.status
            )));
        }

        let envelope: ResponseEnvelope<Value> = response.json()?;

        if envelope.code == self.config.success_code {
            return Ok(envelope.data.unwrap_or(Value::Null));
        }

        let message = envelope.failure_message().to_string();
        if self.config.is_auth_rejection(envelope.code) {
            // 请求在途期间会话已更换时，失效的是旧令牌，不影响新会话
            if self.session.token().as_deref() == sent_token {
                warn!(code = envelope.code, "authentication rejected, clearing session");
                if let Err(e) = self.session.clear_session() {
                    error!(error = %e, "failed to clear rejected session");
                }
            } else {
                warn!(code = envelope.code, "stale token rejected, keeping the newer session");
            }
            return Err(RequestFailure::AuthenticationRejected {
                code: envelope.code,
                message,
            });
        }

        Err(RequestFailure::Application {
            code: envelope.code,
            message,
        })
    }
}
