//! 医院预约系统客户端核心
//!
//! 会话状态、带身份的请求管道和路由守卫。
//! 平台相关部分（HTTP 传输、持久化、历史记录）都通过 trait 注入，
//! 原生环境用 reqwest + 文件，浏览器环境用 fetch + localStorage。

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod navigator;
pub mod pipeline;
pub mod request;
pub mod route;
pub mod session;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use api::HospitalApi;
pub use config::{ClientConfig, PostLoginRedirect};
pub use guard::{Decision, evaluate};
pub use navigator::{History, MemoryHistory, Navigation, Navigator};
pub use pipeline::{RequestFailure, RequestPipeline, RequestResult};
pub use request::{HttpClient, HttpRequest, HttpResponse, TransportError};
pub use route::{AccessLevel, RouteDescriptor, RouteTable, ViewId};
pub use session::{MemoryStorage, Session, SessionStorage, SessionStore, StorageError};

#[cfg(not(target_arch = "wasm32"))]
pub use request::ReqwestHttpClient;
#[cfg(not(target_arch = "wasm32"))]
pub use session::FileStorage;

pub use hospital_shared as shared;
