//! 导航守卫
//!
//! 纯函数：只看目标路由的访问级别和会话快照，不持有状态，不会失败。

use crate::route::AccessLevel;
use crate::session::Session;

/// 守卫的三种结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectLogin,
    /// 已登录但角色不符，回首页而不是错误页
    RedirectHome,
}

/// **核心守卫逻辑**
pub fn evaluate(access: AccessLevel, session: &Session) -> Decision {
    match access {
        AccessLevel::Public => Decision::Allow,
        _ if !session.is_authenticated() => Decision::RedirectLogin,
        AccessLevel::Authenticated => Decision::Allow,
        AccessLevel::Role(required) if session.has_role(required) => Decision::Allow,
        AccessLevel::Role(_) => Decision::RedirectHome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::profile;
    use hospital_shared::Role;

    fn signed_in(role: Role) -> Session {
        Session::authenticated("t1", profile(role))
    }

    #[test]
    fn public_always_allows() {
        assert_eq!(evaluate(AccessLevel::Public, &Session::anonymous()), Decision::Allow);
        for role in [Role::Patient, Role::Doctor, Role::Admin] {
            assert_eq!(evaluate(AccessLevel::Public, &signed_in(role)), Decision::Allow);
        }
    }

    #[test]
    fn authenticated_routes() {
        assert_eq!(
            evaluate(AccessLevel::Authenticated, &Session::anonymous()),
            Decision::RedirectLogin
        );
        for role in [Role::Patient, Role::Doctor, Role::Admin] {
            assert_eq!(
                evaluate(AccessLevel::Authenticated, &signed_in(role)),
                Decision::Allow
            );
        }
    }

    #[test]
    fn role_routes() {
        let admin_only = AccessLevel::Role(Role::Admin);
        assert_eq!(
            evaluate(admin_only, &Session::anonymous()),
            Decision::RedirectLogin
        );
        assert_eq!(
            evaluate(admin_only, &signed_in(Role::Patient)),
            Decision::RedirectHome
        );
        assert_eq!(
            evaluate(admin_only, &signed_in(Role::Doctor)),
            Decision::RedirectHome
        );
        assert_eq!(evaluate(admin_only, &signed_in(Role::Admin)), Decision::Allow);
    }
}
