//! 会话状态模块
//!
//! 当前登录身份（令牌 + 用户资料）的唯一来源。
//! 存储后端可注入：内存、文件（原生）或浏览器 localStorage（wasm）。
//! 每次读取都直接访问存储，因此会话变更对下一次导航或请求立即可见。

use hospital_shared::{Role, STORAGE_TOKEN_KEY, STORAGE_USER_KEY, UserProfile};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("存储不可用: {0}")]
    Unavailable(String),
    #[error("写入 {key} 失败: {message}")]
    Write { key: String, message: String },
    #[error("用户资料序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =========================================================
// 持久化槽位 (Storage Slots)
// =========================================================

/// 键值存储抽象，会话占用 `token` 与 `user` 两个槽位
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// 进程内存储，用于测试和无需持久化的场景
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

/// 文件存储：每个槽位对应目录下的一个文件，进程重启后仍可读取
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(key)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.slot_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_err = |e: std::io::Error| StorageError::Write {
            key: key.to_string(),
            message: e.to_string(),
        };

        std::fs::create_dir_all(&self.dir).map_err(write_err)?;
        // 先写临时文件再 rename，读者不会看到写了一半的内容
        let tmp = self.dir.join(format!(".{key}.tmp"));
        std::fs::write(&tmp, value).map_err(write_err)?;
        std::fs::rename(&tmp, self.slot_path(key)).map_err(write_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Write {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

// =========================================================
// 会话 (Session)
// =========================================================

/// 会话快照
///
/// 不变量：`user` 存在时 `token` 一定存在。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }
}

/// 会话存储句柄
///
/// 克隆开销很小，所有克隆共享同一个底层存储。
/// 只有登录/注销流程和请求管道的失败处理会写入。
#[derive(Clone)]
pub struct SessionStore {
    storage: Rc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(storage: Rc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStorage::new()))
    }

    /// 写入会话
    ///
    /// 先写用户资料再写令牌：令牌槽位是会话存在的标志，
    /// 令牌写入失败时回滚用户资料。
    pub fn set_session(&self, token: &str, user: &UserProfile) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set(STORAGE_USER_KEY, &user_json)?;

        if let Err(e) = self.storage.set(STORAGE_TOKEN_KEY, token) {
            let _ = self.storage.remove(STORAGE_USER_KEY);
            return Err(e);
        }

        debug!(user = %user.username, role = %user.role, "session established");
        Ok(())
    }

    /// 清除会话
    ///
    /// 先移除令牌，之后发出的请求不再携带旧令牌。两个槽位都会尝试移除。
    pub fn clear_session(&self) -> Result<(), StorageError> {
        let token_result = self.storage.remove(STORAGE_TOKEN_KEY);
        let user_result = self.storage.remove(STORAGE_USER_KEY);
        debug!("session cleared");
        token_result.and(user_result)
    }

    /// 读取快照
    ///
    /// 任一槽位缺失或用户资料无法解析都视为匿名。
    pub fn session(&self) -> Session {
        let Some(token) = self
            .storage
            .get(STORAGE_TOKEN_KEY)
            .filter(|t| !t.is_empty())
        else {
            return Session::anonymous();
        };

        let Some(raw_user) = self.storage.get(STORAGE_USER_KEY) else {
            return Session::anonymous();
        };

        match serde_json::from_str::<UserProfile>(&raw_user) {
            Ok(user) => Session::authenticated(token, user),
            Err(e) => {
                warn!(error = %e, "stored user profile is unreadable, treating as anonymous");
                Session::anonymous()
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.session().token
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.session().has_role(role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: 1,
            username: "alice".to_string(),
            role,
            real_name: None,
        }
    }

    /// 令牌槽位写入失败的存储
    struct BrokenTokenStorage(MemoryStorage);

    impl SessionStorage for BrokenTokenStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == STORAGE_TOKEN_KEY {
                return Err(StorageError::Unavailable("quota exceeded".into()));
            }
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = SessionStore::in_memory();
        let user = profile(Role::Doctor);
        store.set_session("t1", &user).unwrap();

        let session = store.session();
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(session.user(), Some(&user));
        assert!(store.has_role(Role::Doctor));
        assert!(!store.has_role(Role::Admin));
    }

    #[test]
    fn clear_then_get_is_anonymous() {
        let store = SessionStore::in_memory();
        store.set_session("t1", &profile(Role::Admin)).unwrap();
        store.clear_session().unwrap();

        assert_eq!(store.session(), Session::anonymous());
        assert!(store.token().is_none());
        assert!(!store.has_role(Role::Admin));
    }

    #[test]
    fn relogin_replaces_profile_wholesale() {
        let store = SessionStore::in_memory();
        store.set_session("t1", &profile(Role::Patient)).unwrap();
        let mut admin = profile(Role::Admin);
        admin.username = "root".into();
        store.set_session("t2", &admin).unwrap();

        let session = store.session();
        assert_eq!(session.token(), Some("t2"));
        assert_eq!(session.user().unwrap().username, "root");
    }

    #[test]
    fn clones_share_storage() {
        let store = SessionStore::in_memory();
        let other = store.clone();
        store.set_session("t1", &profile(Role::Patient)).unwrap();
        assert!(other.is_authenticated());
        other.clear_session().unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn missing_or_corrupt_slot_reads_as_anonymous() {
        let storage = Rc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());

        storage.set(STORAGE_TOKEN_KEY, "t1").unwrap();
        assert_eq!(store.session(), Session::anonymous());

        storage.set(STORAGE_USER_KEY, "{not json").unwrap();
        assert_eq!(store.session(), Session::anonymous());

        storage.remove(STORAGE_TOKEN_KEY).unwrap();
        storage
            .set(STORAGE_USER_KEY, &serde_json::to_string(&profile(Role::Admin)).unwrap())
            .unwrap();
        assert_eq!(store.session(), Session::anonymous());
    }

    #[test]
    fn failed_token_write_rolls_back_user() {
        let storage = Rc::new(BrokenTokenStorage(MemoryStorage::new()));
        let store = SessionStore::new(storage.clone());

        assert!(store.set_session("t1", &profile(Role::Admin)).is_err());
        assert!(storage.get(STORAGE_USER_KEY).is_none());
        assert_eq!(store.session(), Session::anonymous());
    }

    #[test]
    fn file_storage_survives_a_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        let user = profile(Role::Patient);

        SessionStore::new(Rc::new(FileStorage::new(dir.path())))
            .set_session("persisted", &user)
            .unwrap();

        // 模拟进程重启：全新的存储句柄
        let reopened = SessionStore::new(Rc::new(FileStorage::new(dir.path())));
        assert_eq!(reopened.session(), Session::authenticated("persisted", user));

        reopened.clear_session().unwrap();
        assert!(!dir.path().join(STORAGE_TOKEN_KEY).exists());
        // 重复清除不报错
        reopened.clear_session().unwrap();
    }
}
