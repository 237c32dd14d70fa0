//! 各资源的 API 封装
//!
//! 每个方法只构造请求描述并交给请求管道，不含任何业务逻辑。

use crate::pipeline::{RequestPipeline, RequestResult};
use crate::request::HttpClient;
use hospital_shared::{
    ApiCall, Appointment, CreateAppointmentRequest, Department, Doctor, MedicalGuidance, Patient,
};
use serde::Serialize;
use serde_json::{Value, json};

/// API 入口，按资源分组
#[derive(Clone, Copy)]
pub struct HospitalApi<'a, C: HttpClient> {
    pipeline: &'a RequestPipeline<C>,
}

impl<'a, C: HttpClient> HospitalApi<'a, C> {
    pub fn new(pipeline: &'a RequestPipeline<C>) -> Self {
        Self { pipeline }
    }

    pub fn users(&self) -> UserApi<'a, C> {
        UserApi(self.pipeline)
    }

    pub fn appointments(&self) -> AppointmentApi<'a, C> {
        AppointmentApi(self.pipeline)
    }

    pub fn departments(&self) -> DepartmentApi<'a, C> {
        DepartmentApi(self.pipeline)
    }

    pub fn doctors(&self) -> DoctorApi<'a, C> {
        DoctorApi(self.pipeline)
    }

    pub fn patients(&self) -> PatientApi<'a, C> {
        PatientApi(self.pipeline)
    }

    pub fn guidance(&self) -> GuidanceApi<'a, C> {
        GuidanceApi(self.pipeline)
    }
}

fn body<T: Serialize>(value: &T) -> RequestResult<Value> {
    Ok(serde_json::to_value(value)?)
}

// =========================================================
// 用户 (/api/user)
// =========================================================

pub struct UserApi<'a, C: HttpClient>(&'a RequestPipeline<C>);

impl<C: HttpClient> UserApi<'_, C> {
    /// 当前用户的完整资料
    pub async fn info(&self) -> RequestResult<Value> {
        self.0.dispatch(ApiCall::get("/api/user/info")).await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> RequestResult<()> {
        let call = ApiCall::post("/api/user/change-password").with_body(json!({
            "oldPassword": old_password,
            "newPassword": new_password,
        }));
        self.0.dispatch(call).await
    }

    /// 管理员：全部用户
    pub async fn all(&self) -> RequestResult<Vec<Value>> {
        self.0.dispatch(ApiCall::get("/api/user/all")).await
    }

    pub async fn update_status(&self, user_id: i64, status: i32) -> RequestResult<()> {
        let call = ApiCall::put(format!("/api/user/status/{user_id}"))
            .with_body(json!({ "status": status }));
        self.0.dispatch(call).await
    }

    pub async fn delete(&self, user_id: i64) -> RequestResult<()> {
        self.0
            .dispatch(ApiCall::delete(format!("/api/user/delete/{user_id}")))
            .await
    }
}

// =========================================================
// 预约 (/api/appointment)
// =========================================================

/// 管理端预约列表的筛选条件，未设置的字段不会出现在查询串中
#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub department_id: Option<i64>,
    pub status: Option<i32>,
    pub recent: bool,
}

impl AppointmentQuery {
    /// 最近的预约记录（Dashboard 使用）
    pub fn recent() -> Self {
        Self {
            recent: true,
            ..Self::default()
        }
    }

    fn apply(&self, mut call: ApiCall) -> ApiCall {
        if let Some(page) = self.page {
            call = call.with_query("page", page);
        }
        if let Some(size) = self.page_size {
            call = call.with_query("pageSize", size);
        }
        if let Some(name) = &self.patient_name {
            call = call.with_query("patientName", name);
        }
        if let Some(name) = &self.doctor_name {
            call = call.with_query("doctorName", name);
        }
        if let Some(id) = self.department_id {
            call = call.with_query("departmentId", id);
        }
        if let Some(status) = self.status {
            call = call.with_query("status", status);
        }
        if self.recent {
            call = call.with_query("recent", true);
        }
        call
    }
}

pub struct AppointmentApi<'a, C: HttpClient>(&'a RequestPipeline<C>);

impl<C: HttpClient> AppointmentApi<'_, C> {
    /// 当前患者的预约
    pub async fn patient_list(&self) -> RequestResult<Vec<Appointment>> {
        self.0
            .dispatch(ApiCall::get("/api/appointment/patient-list"))
            .await
    }

    /// 当前医生的预约
    pub async fn doctor_list(&self) -> RequestResult<Vec<Appointment>> {
        self.0
            .dispatch(ApiCall::get("/api/appointment/doctor-list"))
            .await
    }

    pub async fn create(&self, request: &CreateAppointmentRequest) -> RequestResult<Value> {
        let call = ApiCall::post("/api/appointment/create").with_body(body(request)?);
        self.0.dispatch(call).await
    }

    /// 医生/管理员更新预约状态
    pub async fn update_status(&self, appointment_id: i64, status: i32) -> RequestResult<()> {
        let call = ApiCall::put("/api/appointment/status").with_body(json!({
            "appointmentId": appointment_id,
            "status": status,
        }));
        self.0.dispatch(call).await
    }

    pub async fn detail(&self, appointment_id: i64) -> RequestResult<Appointment> {
        self.0
            .dispatch(ApiCall::get(format!("/api/appointment/detail/{appointment_id}")))
            .await
    }

    /// 患者取消自己的预约
    pub async fn cancel(&self, appointment_id: i64) -> RequestResult<()> {
        self.0
            .dispatch(ApiCall::post(format!("/api/appointment/cancel/{appointment_id}")))
            .await
    }

    /// 管理员取消预约，原因通过查询参数传递
    pub async fn admin_cancel(&self, appointment_id: i64, reason: &str) -> RequestResult<()> {
        let call = ApiCall::post(format!("/api/appointment/admin/cancel/{appointment_id}"))
            .with_query("reason", reason);
        self.0.dispatch(call).await
    }

    pub async fn list(&self, query: &AppointmentQuery) -> RequestResult<Vec<Appointment>> {
        self.0
            .dispatch(query.apply(ApiCall::get("/api/appointment/list")))
            .await
    }

    pub async fn stats(&self) -> RequestResult<Value> {
        self.0.dispatch(ApiCall::get("/api/appointment/stats")).await
    }
}

// =========================================================
// 科室 (/api/department)
// =========================================================

pub struct DepartmentApi<'a, C: HttpClient>(&'a RequestPipeline<C>);

impl<C: HttpClient> DepartmentApi<'_, C> {
    pub async fn list(&self) -> RequestResult<Vec<Department>> {
        self.0.dispatch(ApiCall::get("/api/department/list")).await
    }

    pub async fn detail(&self, dept_id: i64) -> RequestResult<Department> {
        self.0
            .dispatch(ApiCall::get(format!("/api/department/detail/{dept_id}")))
            .await
    }

    pub async fn add(&self, department: &Department) -> RequestResult<()> {
        let call = ApiCall::post("/api/department/add").with_body(body(department)?);
        self.0.dispatch(call).await
    }

    pub async fn update(&self, department: &Department) -> RequestResult<()> {
        let call = ApiCall::put("/api/department/update").with_body(body(department)?);
        self.0.dispatch(call).await
    }

    pub async fn update_status(&self, dept_id: i64, status: i32) -> RequestResult<()> {
        let call = ApiCall::put("/api/department/status")
            .with_body(json!({ "deptId": dept_id, "status": status }));
        self.0.dispatch(call).await
    }

    pub async fn search(&self, keyword: &str) -> RequestResult<Vec<Department>> {
        let call = ApiCall::get("/api/department/search").with_query("keyword", keyword);
        self.0.dispatch(call).await
    }

    pub async fn delete(&self, dept_id: i64) -> RequestResult<()> {
        self.0
            .dispatch(ApiCall::delete(format!("/api/department/delete/{dept_id}")))
            .await
    }

    pub async fn doctors(&self, dept_id: i64) -> RequestResult<Vec<Doctor>> {
        self.0
            .dispatch(ApiCall::get(format!("/api/department/doctors/{dept_id}")))
            .await
    }
}

// =========================================================
// 医生 (/api/doctor)
// =========================================================

pub struct DoctorApi<'a, C: HttpClient>(&'a RequestPipeline<C>);

impl<C: HttpClient> DoctorApi<'_, C> {
    pub async fn all(&self) -> RequestResult<Vec<Doctor>> {
        self.0.dispatch(ApiCall::get("/api/doctor/all")).await
    }

    pub async fn by_department(&self, dept_id: i64) -> RequestResult<Vec<Doctor>> {
        self.0
            .dispatch(ApiCall::get(format!("/api/doctor/by-dept/vo/{dept_id}")))
            .await
    }

    pub async fn detail(&self, doctor_id: i64) -> RequestResult<Doctor> {
        self.0
            .dispatch(ApiCall::get(format!("/api/doctor/detail/vo/{doctor_id}")))
            .await
    }

    pub async fn update(&self, doctor: &Value) -> RequestResult<()> {
        let call = ApiCall::put("/api/doctor/update").with_body(doctor.clone());
        self.0.dispatch(call).await
    }

    pub async fn update_status(&self, doctor_id: i64, status: i32) -> RequestResult<()> {
        let call = ApiCall::put("/api/doctor/status")
            .with_body(json!({ "doctorId": doctor_id, "status": status }));
        self.0.dispatch(call).await
    }

    pub async fn search(&self, keyword: &str) -> RequestResult<Vec<Doctor>> {
        let call = ApiCall::get("/api/doctor/search").with_query("keyword", keyword);
        self.0.dispatch(call).await
    }

    /// 当前登录医生
    pub async fn current(&self) -> RequestResult<Doctor> {
        self.0.dispatch(ApiCall::get("/api/doctor/current/vo")).await
    }
}

// =========================================================
// 患者 (/api/patient)
// =========================================================

pub struct PatientApi<'a, C: HttpClient>(&'a RequestPipeline<C>);

impl<C: HttpClient> PatientApi<'_, C> {
    pub async fn profile(&self) -> RequestResult<Patient> {
        self.0.dispatch(ApiCall::get("/api/patient/profile")).await
    }

    pub async fn update_profile(&self, profile: &Patient) -> RequestResult<()> {
        let call = ApiCall::put("/api/patient/profile").with_body(body(profile)?);
        self.0.dispatch(call).await
    }

    pub async fn info(&self, patient_id: i64) -> RequestResult<Patient> {
        self.0
            .dispatch(ApiCall::get(format!("/api/patient/info/{patient_id}")))
            .await
    }

    /// 管理员：全部患者
    pub async fn list(&self) -> RequestResult<Vec<Patient>> {
        self.0.dispatch(ApiCall::get("/api/patient/list")).await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> RequestResult<()> {
        let call = ApiCall::put("/api/patient/change-password").with_body(json!({
            "oldPassword": old_password,
            "newPassword": new_password,
        }));
        self.0.dispatch(call).await
    }
}

// =========================================================
// 导诊 (/api/guidance)
// =========================================================

pub struct GuidanceApi<'a, C: HttpClient>(&'a RequestPipeline<C>);

impl<C: HttpClient> GuidanceApi<'_, C> {
    /// 按症状推荐科室
    pub async fn recommend(&self, symptoms: &str, description: Option<&str>) -> RequestResult<Value> {
        let mut payload = json!({ "symptoms": symptoms });
        if let Some(description) = description {
            payload["description"] = json!(description);
        }
        let call = ApiCall::post("/api/guidance/recommend").with_body(payload);
        self.0.dispatch(call).await
    }

    pub async fn save(&self, guidance: &MedicalGuidance) -> RequestResult<Value> {
        let call = ApiCall::post("/api/guidance/save").with_body(body(guidance)?);
        self.0.dispatch(call).await
    }

    pub async fn history(&self) -> RequestResult<Vec<MedicalGuidance>> {
        self.0.dispatch(ApiCall::get("/api/guidance/history")).await
    }

    pub async fn detail(&self, guidance_id: i64) -> RequestResult<MedicalGuidance> {
        self.0
            .dispatch(ApiCall::get(format!("/api/guidance/detail/{guidance_id}")))
            .await
    }

    /// 状态：1 未就诊 / 2 已就诊 / 3 已忽略
    pub async fn update_status(&self, guidance_id: i64, status: i32) -> RequestResult<()> {
        let call = ApiCall::put("/api/guidance/status")
            .with_body(json!({ "guidanceId": guidance_id, "status": status }));
        self.0.dispatch(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RequestFailure;
    use crate::pipeline::tests::{BASE, setup};
    use crate::session::tests::profile;
    use hospital_shared::{HttpMethod, Role};

    #[tokio::test]
    async fn department_list_is_typed() {
        let (client, pipeline) = setup();
        client.mock_response(
            &format!("{BASE}/api/department/list"),
            200,
            json!({"code": 200, "data": [
                {"id": 1, "deptName": "内科", "status": 1},
                {"id": 2, "deptName": "外科"}
            ]}),
        );

        let depts = HospitalApi::new(&pipeline).departments().list().await.unwrap();
        assert_eq!(depts.len(), 2);
        assert_eq!(depts[0].dept_name, "内科");
        assert!(depts[1].status.is_none());
    }

    #[tokio::test]
    async fn admin_cancel_sends_reason_as_query_with_token() {
        let (client, pipeline) = setup();
        pipeline
            .session()
            .set_session("admin-token", &profile(Role::Admin))
            .unwrap();
        client.mock_response(
            &format!("{BASE}/api/appointment/admin/cancel/12?reason=%E5%81%9C%E8%AF%8A"),
            200,
            json!({"code": 200, "message": "success"}),
        );

        HospitalApi::new(&pipeline)
            .appointments()
            .admin_cancel(12, "停诊")
            .await
            .unwrap();

        let req = client.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("token"), Some("admin-token"));
    }

    #[tokio::test]
    async fn appointment_query_only_sends_set_fields() {
        let (client, pipeline) = setup();
        client.mock_response(
            &format!("{BASE}/api/appointment/list?recent=true"),
            200,
            json!({"code": 200, "data": []}),
        );
        let list = HospitalApi::new(&pipeline)
            .appointments()
            .list(&AppointmentQuery::recent())
            .await
            .unwrap();
        assert!(list.is_empty());

        let query = AppointmentQuery {
            page: Some(2),
            status: Some(1),
            ..Default::default()
        };
        let call = query.apply(ApiCall::get("/x"));
        assert_eq!(
            call.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "1".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn guidance_status_body_shape() {
        let (client, pipeline) = setup();
        client.mock_response(
            &format!("{BASE}/api/guidance/status"),
            200,
            json!({"code": 200}),
        );

        HospitalApi::new(&pipeline)
            .guidance()
            .update_status(4, 2)
            .await
            .unwrap();

        let req = client.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, json!({"guidanceId": 4, "status": 2}));
    }

    #[tokio::test]
    async fn user_status_goes_in_body() {
        let (client, pipeline) = setup();
        client.mock_response(
            &format!("{BASE}/api/user/status/3"),
            200,
            json!({"code": 200}),
        );

        HospitalApi::new(&pipeline)
            .users()
            .update_status(3, 0)
            .await
            .unwrap();

        let req = client.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, format!("{BASE}/api/user/status/3"));
        let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, json!({"status": 0}));
    }

    #[tokio::test]
    async fn wrapper_surfaces_backend_failure() {
        let (client, pipeline) = setup();
        client.mock_response(
            &format!("{BASE}/api/patient/list"),
            200,
            json!({"code": 400, "message": "权限不足"}),
        );

        let err = HospitalApi::new(&pipeline).patients().list().await.unwrap_err();
        assert_eq!(
            err,
            RequestFailure::Application {
                code: 400,
                message: "权限不足".into()
            }
        );
    }
}
