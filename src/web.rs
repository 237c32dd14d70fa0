//! 浏览器适配层 (wasm32)
//!
//! 把 localStorage、fetch 和 History API 接到平台无关的抽象上。
//! 所有对 `window` 的访问都集中在这里。

use crate::navigator::{History, Navigator};
use crate::request::{HttpClient, HttpRequest, HttpResponse, TransportError};
use crate::session::{SessionStorage, StorageError};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

/// 安装 panic hook，在控制台输出可读的 panic 信息
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_err(e: JsValue) -> String {
    format!("{:?}", e)
}

// =========================================================
// localStorage
// =========================================================

/// 基于 `window.localStorage` 的会话存储
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("无法获取 window 对象".into()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_err(e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage 已禁用".into()))
    }
}

impl SessionStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: js_err(e),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: js_err(e),
            })
    }
}

// =========================================================
// fetch
// =========================================================

/// 基于 `window.fetch` 的 HTTP 客户端
///
/// fetch 本身没有超时，由浏览器的网络栈决定。
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchHttpClient;

#[async_trait::async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let headers = Headers::new().map_err(|e| TransportError::Build(js_err(e)))?;
        for (key, value) in &req.headers {
            headers
                .set(key, value)
                .map_err(|e| TransportError::Build(js_err(e)))?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        if let Some(body) = &req.body {
            headers
                .set("Content-Type", "application/json")
                .map_err(|e| TransportError::Build(js_err(e)))?;
            opts.set_body(&JsValue::from_str(body));
        }
        opts.set_headers(&headers.into());

        let request = Request::new_with_str_and_init(&req.url, &opts)
            .map_err(|e| TransportError::Build(js_err(e)))?;

        let window = web_sys::window()
            .ok_or_else(|| TransportError::Network("无法获取 window 对象".into()))?;

        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| TransportError::Network(js_err(e)))?;
        let response: Response = value
            .dyn_into()
            .map_err(|e| TransportError::Body(js_err(e)))?;

        let status = response.status();
        let promise = response
            .text()
            .map_err(|e| TransportError::Body(js_err(e)))?;
        let body = JsFuture::from(promise)
            .await
            .map_err(|e| TransportError::Body(js_err(e)))?
            .as_string()
            .ok_or_else(|| TransportError::Body("无法转换为字符串".into()))?;

        Ok(HttpResponse { status, body })
    }
}

// =========================================================
// History API
// =========================================================

/// 基于 `window.history` 的历史记录
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHistory;

impl History for BrowserHistory {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| {
                let location = w.location();
                let path = location.pathname().ok()?;
                let search = location.search().unwrap_or_default();
                Some(format!("{path}{search}"))
            })
            .unwrap_or_else(|| "/".to_string())
    }

    fn push(&self, path: &str) {
        if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }

    fn replace(&self, path: &str) {
        if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 监听后退/前进按钮，每次 popstate 都重新执行守卫
pub fn listen_popstate(navigator: Rc<Navigator<BrowserHistory>>) {
    let closure = Closure::<dyn Fn()>::new(move || {
        navigator.sync_with_history();
    });

    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
    }

    // 监听器与页面同生命周期
    closure.forget();
}
