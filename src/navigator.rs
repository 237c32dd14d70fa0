//! 路由服务 - 导航引擎
//!
//! 实现"请求 -> 守卫 -> 处理 -> 加载"的导航流程。
//! 历史记录通过 `History` 注入：浏览器中是 History API，测试和原生环境是内存栈。

use crate::config::PostLoginRedirect;
use crate::guard::{Decision, evaluate};
use crate::route::{HOME_PATH, RouteDescriptor, RouteTable, ViewId};
use crate::session::SessionStore;
use std::cell::RefCell;
use tracing::warn;

/// 历史记录抽象
pub trait History {
    fn current_path(&self) -> String;
    fn push(&self, path: &str);
    fn replace(&self, path: &str);
}

/// 内存历史栈
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RefCell<Vec<String>>,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: RefCell::new(vec![initial.to_string()]),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// 模拟后退按钮，返回是否成功后退
    pub fn back(&self) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.len() > 1 {
            entries.pop();
            true
        } else {
            false
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn current_path(&self) -> String {
        self.entries
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    fn push(&self, path: &str) {
        self.entries.borrow_mut().push(path.to_string());
    }

    fn replace(&self, path: &str) {
        let mut entries = self.entries.borrow_mut();
        match entries.last_mut() {
            Some(last) => *last = path.to_string(),
            None => entries.push(path.to_string()),
        }
    }
}

/// 一次导航的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// 请求的路径
    pub requested: String,
    pub decision: Decision,
    /// 实际落地的路由
    pub route: RouteDescriptor,
}

impl Navigation {
    pub fn is_redirect(&self) -> bool {
        self.decision != Decision::Allow
    }
}

/// 路由器服务
///
/// 守卫在提交导航之前同步执行，受限视图不会被短暂渲染。
pub struct Navigator<H: History> {
    table: RouteTable,
    session: SessionStore,
    history: H,
    policy: PostLoginRedirect,
    current: RefCell<RouteDescriptor>,
    /// Preserve 策略下被拦截的原目标
    pending: RefCell<Option<String>>,
}

impl<H: History> Navigator<H> {
    /// 创建路由服务，并对历史记录中的当前路径执行一次守卫
    pub fn new(
        table: RouteTable,
        session: SessionStore,
        history: H,
        policy: PostLoginRedirect,
    ) -> Self {
        let initial = table.home().clone();
        let navigator = Self {
            table,
            session,
            history,
            policy,
            current: RefCell::new(initial),
            pending: RefCell::new(None),
        };
        navigator.sync_with_history();
        navigator
    }

    pub fn current(&self) -> RouteDescriptor {
        self.current.borrow().clone()
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// 导航到指定路径（pushState）
    pub fn navigate(&self, path: &str) -> Navigation {
        self.navigate_to(path, true)
    }

    /// 浏览器后退/前进后调用：对历史中的当前路径重新执行守卫（replaceState）
    pub fn sync_with_history(&self) -> Navigation {
        let path = self.history.current_path();
        self.navigate_to(&path, false)
    }

    /// 会话变化（登录、注销、令牌失效）后重新校验当前路由
    pub fn revalidate(&self) -> Navigation {
        let path = self.current.borrow().path.clone();
        self.navigate_to(&path, false)
    }

    /// 取出被拦截的原目标（仅 Preserve 策略会记录）
    pub fn take_post_login_target(&self) -> Option<String> {
        self.pending.borrow_mut().take()
    }

    /// 登录成功后的跳转：原目标优先，否则首页
    pub fn after_login(&self) -> Navigation {
        let target = self
            .take_post_login_target()
            .unwrap_or_else(|| HOME_PATH.to_string());
        self.navigate(&target)
    }

    fn navigate_to(&self, path: &str, use_push: bool) -> Navigation {
        let target = self.table.resolve(path).clone();
        let session = self.session.session();
        let decision = evaluate(target.access, &session);

        let landed = match decision {
            Decision::Allow => {
                // 用户已离开被拦截的目标，只有停留在登录/注册页时才保留
                if !matches!(target.view, ViewId::Login | ViewId::Register) {
                    self.pending.borrow_mut().take();
                }
                target
            }
            Decision::RedirectLogin => {
                warn!(%path, "access denied, redirecting to login");
                if self.policy == PostLoginRedirect::Preserve {
                    *self.pending.borrow_mut() = Some(path.to_string());
                }
                self.table.login().clone()
            }
            Decision::RedirectHome => {
                warn!(%path, "role mismatch, redirecting to home");
                self.table.home().clone()
            }
        };

        // 重定向时写入落地路由的规范路径；放行时保留原始路径（含查询串）
        let history_path = if decision == Decision::Allow {
            path
        } else {
            landed.path.as_str()
        };
        if use_push {
            self.history.push(history_path);
        } else {
            self.history.replace(history_path);
        }
        *self.current.borrow_mut() = landed.clone();

        Navigation {
            requested: path.to_string(),
            decision,
            route: landed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::profile;
    use hospital_shared::Role;

    fn navigator(policy: PostLoginRedirect) -> Navigator<MemoryHistory> {
        Navigator::new(
            RouteTable::hospital(),
            SessionStore::in_memory(),
            MemoryHistory::default(),
            policy,
        )
    }

    fn sign_in(nav: &Navigator<MemoryHistory>, role: Role) {
        nav.session.set_session("t1", &profile(role)).unwrap();
    }

    #[test]
    fn starts_on_home_via_alias() {
        let nav = navigator(PostLoginRedirect::Discard);
        assert_eq!(nav.current().view, ViewId::Home);
    }

    #[test]
    fn anonymous_to_admin_redirects_to_login() {
        let nav = navigator(PostLoginRedirect::Discard);
        let result = nav.navigate("/admin/dashboard");

        assert_eq!(result.decision, Decision::RedirectLogin);
        assert_eq!(nav.current().view, ViewId::Login);
        assert_eq!(nav.history().current_path(), "/login");
        // Discard 策略不保留原目标
        assert!(nav.take_post_login_target().is_none());
    }

    #[test]
    fn doctor_to_admin_redirects_home() {
        let nav = navigator(PostLoginRedirect::Discard);
        sign_in(&nav, Role::Doctor);

        let result = nav.navigate("/admin/users");
        assert_eq!(result.decision, Decision::RedirectHome);
        assert_eq!(result.route.view, ViewId::Home);
    }

    #[test]
    fn allowed_navigation_keeps_query() {
        let nav = navigator(PostLoginRedirect::Discard);
        sign_in(&nav, Role::Patient);

        let result = nav.navigate("/appointment?doctorId=3");
        assert!(!result.is_redirect());
        assert_eq!(nav.current().view, ViewId::Appointment);
        assert_eq!(nav.history().current_path(), "/appointment?doctorId=3");
    }

    #[test]
    fn preserve_policy_returns_to_blocked_target() {
        let nav = navigator(PostLoginRedirect::Preserve);
        nav.navigate("/appointment-list");
        assert_eq!(nav.current().view, ViewId::Login);

        sign_in(&nav, Role::Patient);
        let result = nav.after_login();
        assert_eq!(result.route.view, ViewId::AppointmentList);
        assert!(nav.take_post_login_target().is_none());
    }

    #[test]
    fn preserved_target_dropped_after_navigating_elsewhere() {
        let nav = navigator(PostLoginRedirect::Preserve);
        nav.navigate("/appointment-list");
        // 登录页和注册页之间切换不会丢弃原目标
        nav.navigate("/register");
        nav.navigate("/login");
        assert_eq!(
            nav.take_post_login_target().as_deref(),
            Some("/appointment-list")
        );

        nav.navigate("/appointment-list");
        nav.navigate("/doctors");
        sign_in(&nav, Role::Patient);
        assert_eq!(nav.after_login().route.view, ViewId::Home);
    }

    #[test]
    fn discard_policy_lands_home_after_login() {
        let nav = navigator(PostLoginRedirect::Discard);
        nav.navigate("/appointment-list");
        sign_in(&nav, Role::Patient);
        assert_eq!(nav.after_login().route.view, ViewId::Home);
    }

    #[test]
    fn revalidate_after_logout() {
        let nav = navigator(PostLoginRedirect::Discard);
        sign_in(&nav, Role::Admin);
        nav.navigate("/admin/doctors");
        assert_eq!(nav.current().view, ViewId::AdminDoctors);

        nav.session.clear_session().unwrap();
        // 会话变化不会追溯生效，直到下一次导航或显式校验
        assert_eq!(nav.current().view, ViewId::AdminDoctors);
        let result = nav.revalidate();
        assert_eq!(result.decision, Decision::RedirectLogin);
        assert_eq!(nav.current().view, ViewId::Login);
    }

    #[test]
    fn back_button_is_guarded() {
        let nav = navigator(PostLoginRedirect::Discard);
        sign_in(&nav, Role::Patient);
        nav.navigate("/user-info");
        nav.navigate("/doctors");

        nav.session.clear_session().unwrap();
        assert!(nav.history().back());
        let result = nav.sync_with_history();
        assert_eq!(result.decision, Decision::RedirectLogin);
        assert_eq!(nav.history().current_path(), "/login");
    }
}
