//! 客户端配置
//!
//! 每一项都有常量默认值，原生环境下可通过环境变量覆盖。

use hospital_shared::{HEADER_TOKEN, SUCCESS_CODE, UNAUTHORIZED_CODE};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// 如果环境变量中没有定义，则使用这些值
const DEFAULT_BASE_URL: &str = "http://localhost:8083";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const SESSION_DIR_NAME: &str = "hospital-client";

const ENV_BASE_URL: &str = "HOSPITAL_API_BASE_URL";
const ENV_TIMEOUT_MS: &str = "HOSPITAL_API_TIMEOUT_MS";
const ENV_TOKEN_HEADER: &str = "HOSPITAL_TOKEN_HEADER";
const ENV_POST_LOGIN_REDIRECT: &str = "HOSPITAL_POST_LOGIN_REDIRECT";
const ENV_SESSION_DIR: &str = "HOSPITAL_SESSION_DIR";

/// 访问受保护页面被重定向到登录页后，原目标的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostLoginRedirect {
    /// 丢弃原目标，登录后停留在默认页
    #[default]
    Discard,
    /// 记住原目标，登录成功后由调用方取回
    Preserve,
}

impl FromStr for PostLoginRedirect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "preserve" => Ok(Self::Preserve),
            other => Err(format!("unknown post-login redirect policy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 后端 API 基础地址，不含末尾 `/`
    pub base_url: String,
    /// 传输层超时
    pub timeout: Duration,
    pub token_header: String,
    pub success_code: i32,
    /// 视为令牌失效的业务码，命中时清除会话
    pub auth_rejection_codes: Vec<i32>,
    pub post_login_redirect: PostLoginRedirect,
    /// 文件会话存储目录（仅原生环境使用）
    pub session_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            token_header: HEADER_TOKEN.to_string(),
            success_code: SUCCESS_CODE,
            auth_rejection_codes: vec![UNAUTHORIZED_CODE],
            post_login_redirect: PostLoginRedirect::Discard,
            session_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_post_login_redirect(mut self, policy: PostLoginRedirect) -> Self {
        self.post_login_redirect = policy;
        self
    }

    pub fn is_auth_rejection(&self, code: i32) -> bool {
        self.auth_rejection_codes.contains(&code)
    }

    /// 拼接完整 URL
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 从环境变量读取配置，缺失或无法解析的项回退到默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url.trim());
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.timeout = Duration::from_millis(ms),
                Err(_) => warn!(value = %raw, "invalid {ENV_TIMEOUT_MS}, using default"),
            }
        }

        if let Some(header) = lookup(ENV_TOKEN_HEADER).filter(|v| !v.trim().is_empty()) {
            config.token_header = header.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_POST_LOGIN_REDIRECT) {
            match raw.parse() {
                Ok(policy) => config.post_login_redirect = policy,
                Err(e) => warn!("{e}, using default"),
            }
        }

        config.session_dir = lookup(ENV_SESSION_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(default_session_dir);

        config
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_session_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SESSION_DIR_NAME))
}

#[cfg(target_arch = "wasm32")]
fn default_session_dir() -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8083");
        assert_eq!(config.timeout, Duration::from_millis(15_000));
        assert_eq!(config.token_header, "token");
        assert!(config.is_auth_rejection(401));
        assert!(!config.is_auth_rejection(500));
        assert_eq!(config.post_login_redirect, PostLoginRedirect::Discard);
    }

    #[test]
    fn env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "https://his.example.org/"),
            (ENV_TIMEOUT_MS, "3000"),
            (ENV_POST_LOGIN_REDIRECT, "Preserve"),
            (ENV_SESSION_DIR, "/tmp/his"),
        ]));
        assert_eq!(config.base_url, "https://his.example.org");
        assert_eq!(config.timeout, Duration::from_millis(3000));
        assert_eq!(config.post_login_redirect, PostLoginRedirect::Preserve);
        assert_eq!(config.session_dir, Some(PathBuf::from("/tmp/his")));
    }

    #[test]
    fn bad_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_TIMEOUT_MS, "soon"),
            (ENV_POST_LOGIN_REDIRECT, "sometimes"),
        ]));
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.post_login_redirect, PostLoginRedirect::Discard);
    }

    #[test]
    fn url_joining() {
        let config = ClientConfig::new("http://h:1/");
        assert_eq!(config.url("/api/x"), "http://h:1/api/x");
        assert_eq!(config.url("api/x"), "http://h:1/api/x");
    }
}
