use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod date;
pub mod protocol;

pub use date::Timestamp;
pub use protocol::{ApiCall, HttpMethod, ResponseEnvelope};

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 信封中唯一表示成功的状态码
pub const SUCCESS_CODE: i32 = 200;
/// 令牌失效 / 未登录
pub const UNAUTHORIZED_CODE: i32 = 401;
/// 携带会话令牌的请求头
pub const HEADER_TOKEN: &str = "token";
/// 持久化槽位：原始令牌字符串
pub const STORAGE_TOKEN_KEY: &str = "token";
/// 持久化槽位：JSON 序列化的用户资料
pub const STORAGE_USER_KEY: &str = "user";
/// 信封既没有 message 也没有 msg 时的提示
pub const DEFAULT_FAILURE_MESSAGE: &str = "请求失败";

// =========================================================
// 角色与用户 (Identity)
// =========================================================

/// 用户角色（封闭集合）
///
/// 后端登录接口返回 `ROLE_PATIENT` 这类角色编码，路由元数据使用 `PATIENT`，
/// 两种写法都能反序列化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "PATIENT", alias = "ROLE_PATIENT")]
    Patient,
    #[serde(rename = "DOCTOR", alias = "ROLE_DOCTOR")]
    Doctor,
    #[serde(rename = "ADMIN", alias = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        match code.strip_prefix("ROLE_").unwrap_or(&code) {
            "PATIENT" => Ok(Role::Patient),
            "DOCTOR" => Ok(Role::Doctor),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// 当前登录用户的资料，会话期间不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
}

/// 登录请求 (`POST /api/user/login`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

/// 登录响应中的 `data` 部分
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub role_name: Option<String>,
    pub role_code: Role,
}

impl LoginResponse {
    /// 拆分为 (令牌, 用户资料)
    pub fn into_session_parts(self) -> (String, UserProfile) {
        let profile = UserProfile {
            id: self.user_id,
            username: self.username,
            role: self.role_code,
            real_name: self.real_name,
        };
        (self.token, profile)
    }
}

/// 患者注册 (`POST /api/user/register`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub real_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// `male` / `female`，其它值由后端按 `male` 处理
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

// =========================================================
// 业务模型 (Domain Models)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub dept_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort: Option<i32>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub create_time: Option<Timestamp>,
    #[serde(default)]
    pub update_time: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub dept_id: Option<i64>,
    #[serde(default)]
    pub dept_name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub experience: Option<i32>,
    /// 后端为 BigDecimal，按 JSON 数字接收
    #[serde(default)]
    pub consultation_fee: Option<f64>,
    #[serde(default)]
    pub daily_quota: Option<i32>,
    #[serde(default)]
    pub available_quota: Option<i32>,
    #[serde(default)]
    pub status: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub appointment_date: Option<Timestamp>,
    #[serde(default)]
    pub time_slot: Option<i32>,
    #[serde(default)]
    pub time_slot_text: Option<String>,
    #[serde(default)]
    pub symptom_description: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

/// 新建预约 (`POST /api/appointment/create`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub doctor_id: i64,
    pub department_id: i64,
    /// `yyyy-MM-dd`
    pub appointment_date: String,
    pub time_slot: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birthday: Option<Timestamp>,
    #[serde(default)]
    pub address: Option<String>,
}

/// 导诊记录状态：1 未就诊 / 2 已就诊 / 3 已忽略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalGuidance {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub patient_id: Option<i64>,
    pub symptoms_description: String,
    #[serde(default)]
    pub detailed_description: Option<String>,
    #[serde(default)]
    pub recommended_dept_id: Option<i64>,
    #[serde(default)]
    pub recommended_dept_name: Option<String>,
    #[serde(default)]
    pub recommendation_reason: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub guidance_time: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_accepts_backend_codes() {
        let role: Role = serde_json::from_value(json!("ROLE_ADMIN")).unwrap();
        assert_eq!(role, Role::Admin);
        let role: Role = serde_json::from_value(json!("DOCTOR")).unwrap();
        assert_eq!(role, Role::Doctor);
        assert_eq!(serde_json::to_value(Role::Patient).unwrap(), json!("PATIENT"));

        assert_eq!("role_patient".parse::<Role>().unwrap(), Role::Patient);
        assert!("NURSE".parse::<Role>().is_err());
    }

    #[test]
    fn login_response_into_profile() {
        let resp: LoginResponse = serde_json::from_value(json!({
            "token": "t1",
            "userId": 7,
            "username": "alice",
            "realName": "Alice",
            "roleName": "患者",
            "roleCode": "ROLE_PATIENT"
        }))
        .unwrap();

        let (token, profile) = resp.into_session_parts();
        assert_eq!(token, "t1");
        assert_eq!(profile.id, 7);
        assert_eq!(profile.role, Role::Patient);
        assert_eq!(profile.real_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn doctor_tolerates_sparse_payload() {
        let doctor: Doctor = serde_json::from_value(json!({
            "id": 3,
            "realName": "Dr. Li",
            "consultationFee": 25.5,
            "createTime": "2024-03-01T08:00:00.000+00:00"
        }))
        .unwrap();
        assert_eq!(doctor.id, 3);
        assert_eq!(doctor.consultation_fee, Some(25.5));
        assert!(doctor.dept_id.is_none());
    }
}
