//! 路由定义模块 - 领域模型
//!
//! 纯配置数据，不依赖 DOM 或 web_sys。
//! 定义了应用的所有路由、对应视图以及访问级别。

use hospital_shared::Role;
use std::fmt::Display;
use thiserror::Error;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const HOME_PATH: &str = "/home";
pub const NOT_FOUND_PATH: &str = "/404";

/// 路由的访问要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// 任何人可访问
    Public,
    /// 需要登录
    Authenticated,
    /// 需要登录且角色匹配
    Role(Role),
}

/// 视图标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Login,
    Register,
    Home,
    UserInfo,
    DepartmentList,
    DoctorList,
    Appointment,
    AppointmentList,
    MedicalGuide,
    AdminDashboard,
    AdminUsers,
    AdminDepartments,
    AdminDoctors,
    AdminAppointments,
    /// 页面未找到
    NotFound,
}

impl Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub path: String,
    pub view: ViewId,
    pub access: AccessLevel,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>, view: ViewId, access: AccessLevel) -> Self {
        Self {
            path: path.into(),
            view,
            access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("route table has no entry for {0}")]
    Missing(&'static str),
    #[error("{0} must be publicly accessible")]
    NotPublic(&'static str),
    #[error("duplicate route path {0}")]
    Duplicate(String),
}

/// 有序路由表，启动时定义，运行期不可变
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    /// (from, to) 路径重定向，如 `/` -> `/home`
    aliases: Vec<(String, String)>,
    not_found: RouteDescriptor,
}

impl RouteTable {
    /// 构建并校验路由表
    ///
    /// 登录、注册和首页必须存在且为 `Public`，路径不可重复。
    pub fn new(
        routes: Vec<RouteDescriptor>,
        aliases: Vec<(String, String)>,
    ) -> Result<Self, RouteTableError> {
        let table = Self {
            routes,
            aliases,
            not_found: RouteDescriptor::new(NOT_FOUND_PATH, ViewId::NotFound, AccessLevel::Public),
        };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), RouteTableError> {
        for (i, route) in self.routes.iter().enumerate() {
            if self.routes[..i].iter().any(|r| r.path == route.path) {
                return Err(RouteTableError::Duplicate(route.path.clone()));
            }
        }

        for required in [LOGIN_PATH, REGISTER_PATH, HOME_PATH] {
            let route = self
                .find(required)
                .ok_or(RouteTableError::Missing(required))?;
            if route.access != AccessLevel::Public {
                return Err(RouteTableError::NotPublic(required));
            }
        }
        Ok(())
    }

    /// 应用路由表
    pub fn hospital() -> Self {
        use AccessLevel::{Authenticated, Public};
        use ViewId::*;

        let admin = AccessLevel::Role(Role::Admin);
        let routes = vec![
            RouteDescriptor::new(LOGIN_PATH, Login, Public),
            RouteDescriptor::new(REGISTER_PATH, Register, Public),
            RouteDescriptor::new(HOME_PATH, Home, Public),
            RouteDescriptor::new("/user-info", UserInfo, Authenticated),
            RouteDescriptor::new("/departments", DepartmentList, Public),
            RouteDescriptor::new("/doctors", DoctorList, Public),
            RouteDescriptor::new("/appointment", Appointment, Authenticated),
            RouteDescriptor::new("/appointment-list", AppointmentList, Authenticated),
            RouteDescriptor::new("/medical-guide", MedicalGuide, Public),
            // 管理员路由
            RouteDescriptor::new("/admin/dashboard", AdminDashboard, admin),
            RouteDescriptor::new("/admin/users", AdminUsers, admin),
            RouteDescriptor::new("/admin/departments", AdminDepartments, admin),
            RouteDescriptor::new("/admin/doctors", AdminDoctors, admin),
            RouteDescriptor::new("/admin/appointments", AdminAppointments, admin),
        ];

        Self {
            routes,
            aliases: vec![("/".to_string(), HOME_PATH.to_string())],
            not_found: RouteDescriptor::new(NOT_FOUND_PATH, NotFound, Public),
        }
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    fn find(&self, path: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// 将 URL path 解析为路由
    ///
    /// 忽略查询串、片段与末尾的 `/`，未知路径返回 NotFound（公开）。
    pub fn resolve(&self, path: &str) -> &RouteDescriptor {
        let path = normalize(path);
        let path = self
            .aliases
            .iter()
            .find(|(from, _)| from == path)
            .map(|(_, to)| to.as_str())
            .unwrap_or(path);

        self.find(path).unwrap_or(&self.not_found)
    }

    pub fn login(&self) -> &RouteDescriptor {
        self.resolve(LOGIN_PATH)
    }

    pub fn home(&self) -> &RouteDescriptor {
        self.resolve(HOME_PATH)
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
