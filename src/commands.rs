//! User-facing operations.
//!
//! Each operation resolves the session it needs, calls the backend through
//! the right client, and keeps persisted state in step. Operations that need
//! a session fail with `ApiError::NotLoggedIn` before sending anything.

use crate::api::attendance::{self, Punch, PunchReceipt};
use crate::api::error::ApiError;
use crate::api::leave::{self, LeaveApplication, LeaveHistory, LeaveRecap};
use crate::api::overtime::{self, OvertimeRecap};
use crate::api::recap::{self, AttendanceRecap};
use crate::api::request::Attachment;
use crate::api::types::{Coordinates, EmployeeProfile};
use crate::api::{auth, profile as profile_api};
use crate::period::MonthPeriod;
use crate::session::{Credentials, Session};
use crate::state::AppState;

/// Log in and persist the session.
///
/// 1. POST credentials; a response without a token is an error
/// 2. Persist token, user record, and employee id
/// 3. Save or forget the credentials per `remember`
pub async fn login(state: &AppState, username: &str, password: &str, remember: bool) -> Result<Session, ApiError> {
    log::info!("Logging in as {}", username);

    // 1. Authenticate
    let grant = auth::login(&state.api, username, password).await?;

    // 2. Persist session
    state
        .session
        .save(&grant.access_token, &grant.user_json, grant.employee_id.as_deref())
        .await?;

    // 3. Remember me
    if remember {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        state.session.remember(Some(&credentials)).await?;
    } else {
        state.session.remember(None).await?;
    }

    let session = state.session.restore().await?.ok_or_else(|| {
        ApiError::Decode("Stored login response could not be read back".to_string())
    })?;
    *state.current.write().await = Some(session.clone());

    log::info!("Logged in as {}", grant.nama);
    Ok(session)
}

/// Credentials saved by a previous "remember me" login.
pub async fn remembered_credentials(state: &AppState) -> Result<Option<Credentials>, ApiError> {
    Ok(state.session.remembered().await?)
}

/// Restore the persisted session, if any.
pub async fn restore_session(state: &AppState) -> Result<Option<Session>, ApiError> {
    let session = state.session.restore().await?;
    match &session {
        Some(s) => log::info!("Restored session for {}", s.user.nama),
        None => log::info!("No stored session"),
    }
    *state.current.write().await = session.clone();
    Ok(session)
}

/// Remove the session. Remembered credentials are kept.
pub async fn logout(state: &AppState) -> Result<(), ApiError> {
    state.session.logout().await?;
    state.clear_current().await;
    log::info!("Logged out");
    Ok(())
}

/// The persisted session. Read from storage every time so a session wiped
/// by the logout prompt is noticed on the next call.
async fn require_session(state: &AppState) -> Result<Session, ApiError> {
    match state.session.restore().await? {
        Some(session) => {
            *state.current.write().await = Some(session.clone());
            Ok(session)
        }
        None => {
            state.clear_current().await;
            Err(ApiError::NotLoggedIn)
        }
    }
}

async fn require_employee_id(state: &AppState) -> Result<String, ApiError> {
    let session = require_session(state).await?;
    match session.employee_id() {
        Some(id) => Ok(id.to_string()),
        None => state.session.employee_id().await?.ok_or(ApiError::NotLoggedIn),
    }
}

async fn punch(state: &AppState, kind: Punch, photo: Attachment, at: Coordinates) -> Result<PunchReceipt, ApiError> {
    let employee_id = require_employee_id(state).await?;
    let receipt = attendance::punch(&state.api, kind, &employee_id, photo, at).await?;
    log::info!("{} recorded at ({}, {})", kind.label(), at.latitude, at.longitude);
    Ok(receipt)
}

/// Check in with a selfie at the given location.
pub async fn check_in(state: &AppState, photo: Attachment, at: Coordinates) -> Result<PunchReceipt, ApiError> {
    punch(state, Punch::CheckIn, photo, at).await
}

/// Check out with a selfie at the given location.
pub async fn check_out(state: &AppState, photo: Attachment, at: Coordinates) -> Result<PunchReceipt, ApiError> {
    punch(state, Punch::CheckOut, photo, at).await
}

/// Submit a leave request. Returns the server's message, if any.
pub async fn submit_leave(state: &AppState, application: LeaveApplication) -> Result<Option<String>, ApiError> {
    require_session(state).await?;
    leave::submit(&state.api, application).await
}

/// The caller's leave requests, optionally limited to one month.
pub async fn leave_history(state: &AppState, month: Option<MonthPeriod>) -> Result<LeaveHistory, ApiError> {
    require_session(state).await?;
    leave::history(&state.api, month).await
}

pub async fn leave_recap(state: &AppState, month: MonthPeriod) -> Result<LeaveRecap, ApiError> {
    let employee_id = require_employee_id(state).await?;
    leave::recap(&state.api, &employee_id, month).await
}

pub async fn overtime_recap(state: &AppState, month: MonthPeriod) -> Result<OvertimeRecap, ApiError> {
    let employee_id = require_employee_id(state).await?;
    overtime::recap(&state.api, &employee_id, month).await
}

pub async fn attendance_recap(state: &AppState, month: MonthPeriod) -> Result<AttendanceRecap, ApiError> {
    require_session(state).await?;
    recap::attendance(&state.api, month).await
}

pub async fn profile(state: &AppState) -> Result<EmployeeProfile, ApiError> {
    let employee_id = require_employee_id(state).await?;
    profile_api::fetch(&state.api, &employee_id).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::types::LeaveKind;
    use crate::config::{AppConfig, StorageBackend};
    use crate::session::{keys, KeyValueStore, MemoryStore};
    use crate::testing::GatedPrompt;

    async fn setup() -> (MockServer, Arc<MemoryStore>, AppState) {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let config = AppConfig {
            api_base_url: server.uri(),
            storage: StorageBackend::Memory,
            ..AppConfig::default()
        };
        let state = AppState::new(&config, store.clone(), Arc::new(GatedPrompt::new()));
        (server, store, state)
    }

    async fn logged_in() -> (MockServer, Arc<MemoryStore>, AppState) {
        let (server, store, state) = setup().await;
        state
            .session
            .save("abc123", r#"{"nama":"Budi","id_karyawan":7}"#, Some("7"))
            .await
            .unwrap();
        (server, store, state)
    }

    fn december() -> MonthPeriod {
        MonthPeriod::new(2025, 12).unwrap()
    }

    fn selfie() -> Attachment {
        Attachment::new("selfie.jpg", "image/jpeg", vec![0xFF, 0xD8])
    }

    const JAKARTA: Coordinates = Coordinates {
        latitude: -6.2,
        longitude: 106.8,
    };

    // ── Login ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_login_persists_session_and_remembers() {
        let (server, store, state) = setup().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/karyawan"))
            .and(body_json(json!({ "username": "budi", "password": "rahasia" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc123",
                "nama": "Budi",
                "id_karyawan": 7,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = login(&state, "budi", "rahasia", true).await.unwrap();
        assert_eq!(session.token, "abc123");
        assert_eq!(session.employee_id(), Some("7"));

        assert_eq!(store.get(keys::TOKEN).await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(store.get(keys::EMPLOYEE_ID).await.unwrap().as_deref(), Some("7"));
        let user: serde_json::Value = serde_json::from_str(&store.get(keys::USER).await.unwrap().unwrap()).unwrap();
        assert_eq!(user["nama"], "Budi");

        let remembered = remembered_credentials(&state).await.unwrap().unwrap();
        assert_eq!(remembered.username, "budi");
        assert_eq!(remembered.password, "rahasia");
        assert!(state.current.read().await.is_some());
    }

    #[tokio::test]
    async fn test_login_without_remember_forgets() {
        let (server, store, state) = setup().await;
        store.set(keys::REMEMBER_USERNAME, "lama").await.unwrap();
        store.set(keys::REMEMBER_PASSWORD, "lama").await.unwrap();
        store.set(keys::REMEMBER_ME, "true").await.unwrap();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t", "nama": "Budi" })))
            .mount(&server)
            .await;

        login(&state, "budi", "rahasia", false).await.unwrap();

        assert!(remembered_credentials(&state).await.unwrap().is_none());
        assert_eq!(store.get(keys::REMEMBER_ME).await.unwrap().as_deref(), Some("false"));
        assert!(store.get(keys::REMEMBER_USERNAME).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_without_token_fails() {
        let (server, store, state) = setup().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
            .mount(&server)
            .await;

        let err = login(&state, "budi", "rahasia", true).await.unwrap_err();
        assert!(err.to_string().contains("Token not found"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_login_rejected_credentials() {
        let (server, store, state) = setup().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid username or password" })))
            .mount(&server)
            .await;

        let err = login(&state, "budi", "salah", false).await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
        assert!(!state.session.is_prompt_active());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_restore_and_logout() {
        let (_server, store, state) = logged_in().await;
        store.set(keys::REMEMBER_ME, "true").await.unwrap();

        let session = restore_session(&state).await.unwrap().unwrap();
        assert_eq!(session.user.nama, "Budi");

        logout(&state).await.unwrap();
        assert!(restore_session(&state).await.unwrap().is_none());
        assert!(state.current.read().await.is_none());
        assert_eq!(store.get(keys::REMEMBER_ME).await.unwrap().as_deref(), Some("true"));
    }

    // ── Attendance ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_check_in_sends_photo_and_location() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("POST"))
            .and(path("/absensi/check-in/7"))
            .and(query_param("latitude", "-6.2"))
            .and(query_param("longitude", "106.8"))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Check-in berhasil" })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = check_in(&state, selfie(), JAKARTA).await.unwrap();
        assert_eq!(receipt.message.as_deref(), Some("Check-in berhasil"));

        let requests = server.received_requests().await.unwrap();
        let ct = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(ct.starts_with("multipart/form-data; boundary="));
    }

    #[tokio::test]
    async fn test_check_out_uses_put() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("PUT"))
            .and(path("/absensi/check-out/7"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = check_out(&state, selfie(), JAKARTA).await.unwrap();
        assert!(receipt.message.is_none());
    }

    #[tokio::test]
    async fn test_check_in_outside_area() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Di luar radius" })))
            .mount(&server)
            .await;

        let err = check_in(&state, selfie(), JAKARTA).await.unwrap_err();
        assert!(attendance::failure_message(&err).contains("luar area kerja"));
    }

    #[tokio::test]
    async fn test_check_in_with_expired_token_prompts_and_clears() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let prompt = Arc::new(GatedPrompt::new());
        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        let state = AppState::new(&config, store.clone(), prompt.clone());
        state
            .session
            .save("abc123", r#"{"nama":"Budi","id_karyawan":7}"#, Some("7"))
            .await
            .unwrap();
        Mock::given(method("POST"))
            .and(path("/absensi/check-in/7"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired, Login ulang" })))
            .expect(1)
            .mount(&server)
            .await;

        let err = check_in(&state, selfie(), JAKARTA).await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
        assert!(state.session.is_prompt_active());

        prompt.release();
        state.session.settle().await;

        assert_eq!(prompt.shown(), 1);
        assert_eq!(prompt.notices()[0].title, "Sesi Berakhir");
        assert!(store.get(keys::TOKEN).await.unwrap().is_none());
        assert!(store.get(keys::USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_operations_require_session() {
        let (server, _store, state) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        assert!(matches!(check_in(&state, selfie(), JAKARTA).await, Err(ApiError::NotLoggedIn)));
        assert!(matches!(profile(&state).await, Err(ApiError::NotLoggedIn)));
        assert!(matches!(leave_recap(&state, december()).await, Err(ApiError::NotLoggedIn)));
        assert!(matches!(overtime_recap(&state, december()).await, Err(ApiError::NotLoggedIn)));
        assert!(matches!(attendance_recap(&state, december()).await, Err(ApiError::NotLoggedIn)));
        assert!(matches!(leave_history(&state, None).await, Err(ApiError::NotLoggedIn)));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    // ── Leave ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_submit_leave_multipart_fields() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("POST"))
            .and(path("/perizinan-new/ajukan"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "message": "Pengajuan berhasil" })))
            .expect(1)
            .mount(&server)
            .await;

        let application = LeaveApplication {
            kind: LeaveKind::Sakit,
            start: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 12, 3).unwrap(),
            remarks: "Demam".into(),
            attachment: Some(Attachment::new("surat.pdf", "application/pdf", b"%PDF".to_vec())),
        };
        let message = submit_leave(&state, application).await.unwrap();
        assert_eq!(message.as_deref(), Some("Pengajuan berhasil"));

        let requests = server.received_requests().await.unwrap();
        let ct = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(ct.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"id_jenis\"\r\n\r\n4"));
        assert!(body.contains("name=\"tgl_mulai\"\r\n\r\n01-12-2025"));
        assert!(body.contains("name=\"tgl_selesai\"\r\n\r\n03-12-2025"));
        assert!(body.contains("name=\"keterangan\"\r\n\r\nDemam"));
        assert!(body.contains("filename=\"surat.pdf\""));
    }

    #[tokio::test]
    async fn test_submit_leave_bad_range_sends_nothing() {
        let (server, _store, state) = logged_in().await;

        let application = LeaveApplication {
            kind: LeaveKind::Izin,
            start: NaiveDate::from_ymd_opt(2025, 12, 3).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            remarks: String::new(),
            attachment: None,
        };
        let err = submit_leave(&state, application).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_leave_history_summary() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("GET"))
            .and(path("/izin/saya"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [
                { "id_izin": 1, "nama_izin": "Sakit", "tgl_mulai": "2025-12-01", "tgl_selesai": "2025-12-02", "status_approval": "approved" },
                { "id_izin": 2, "nama_izin": "Izin", "tgl_mulai": "2025-12-10", "tgl_selesai": "2025-12-10", "status_approval": "rejected", "alasan_penolakan": "Kurang dokumen" },
                { "id_izin": 3, "nama_izin": "Cuti", "tgl_mulai": "2025-11-20", "tgl_selesai": "2025-11-21", "status_approval": "pending" },
            ]})))
            .mount(&server)
            .await;

        let all = leave_history(&state, None).await.unwrap();
        assert_eq!((all.summary.total, all.summary.pending), (3, 1));

        let dec = leave_history(&state, Some(december())).await.unwrap();
        assert_eq!(dec.summary.total, 2);
        assert_eq!(dec.summary.approved, 1);
        assert_eq!(dec.summary.rejected, 1);
        assert_eq!(dec.records[1].alasan_penolakan.as_deref(), Some("Kurang dokumen"));
    }

    #[tokio::test]
    async fn test_leave_recap_range_and_filter() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("GET"))
            .and(path("/perizinan-new"))
            .and(query_param("id_karyawan", "7"))
            .and(query_param("start_date", "2025-12-01"))
            .and(query_param("end_date", "2025-12-31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [
                { "id_izin": 1, "id_jenis": 4, "tgl_mulai": "2025-12-01", "tgl_selesai": "2025-12-03", "status_izin": "approved" },
                { "id_izin": 2, "id_jenis": 5, "tgl_mulai": "2025-12-15", "tgl_selesai": "2025-12-19", "status_izin": "pending" },
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let recap = leave_recap(&state, december()).await.unwrap();
        assert_eq!(recap.entries.len(), 1);
        assert_eq!(recap.entries[0].days, Some(3));
        assert_eq!(recap.summary.sakit, 1);
        assert_eq!(recap.summary.cuti, 0);
    }

    // ── Recaps ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_overtime_recap_totals() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("GET"))
            .and(path("/lembur"))
            .and(query_param("id_karyawan", "7"))
            .and(query_param("start_date", "2025-12-01"))
            .and(query_param("end_date", "2025-12-31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [
                { "id_lembur": 1, "tanggal": "2025-12-02", "menit_lembur": 120, "total_bayaran": 60000, "status_lembur": "approved" },
                { "id_lembur": 2, "tanggal": "2025-12-03", "menit_lembur": "45", "total_bayaran": "22500", "status_lembur": "approved" },
                { "id_lembur": 3, "tanggal": "2025-12-04", "menit_lembur": 300, "total_bayaran": 150000, "status_lembur": "rejected" },
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let recap = overtime_recap(&state, december()).await.unwrap();
        assert_eq!(recap.totals.count, 2);
        assert_eq!(recap.totals.duration(), "2j 45m");
        assert!((recap.totals.pay - 82500.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_attendance_recap_dmy_range() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("GET"))
            .and(path("/rekapan/absensi/detail"))
            .and(query_param("start_date", "01-12-2025"))
            .and(query_param("end_date", "31-12-2025"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [
                { "tanggal": "2025-12-01", "status_hari": "regular", "nama_status": "Hadir" },
                { "tanggal": "2025-12-02", "status_hari": "regular", "nama_status": "Tidak Hadir" },
                { "tanggal": "2025-12-03", "status_hari": "regular", "nama_status": "Sakit" },
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let recap = attendance_recap(&state, december()).await.unwrap();
        assert_eq!(recap.days.len(), 3);
        assert_eq!((recap.summary.present, recap.summary.absent, recap.summary.excused), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_recap_missing_data_is_empty() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Tidak ada data" })))
            .mount(&server)
            .await;

        let recap = attendance_recap(&state, december()).await.unwrap();
        assert!(recap.days.is_empty());
    }

    #[tokio::test]
    async fn test_profile() {
        let (server, _store, state) = logged_in().await;
        Mock::given(method("GET"))
            .and(path("/pegawai/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {
                "nama": "Budi Santoso", "nip": 19870101, "bank": "BRI", "gaji_pokok": "4500000"
            }})))
            .expect(1)
            .mount(&server)
            .await;

        let p = profile(&state).await.unwrap();
        assert_eq!(p.nama, "Budi Santoso");
        assert_eq!(p.nip.as_deref(), Some("19870101"));
        assert_eq!(p.gaji_pokok, Some(4500000.0));
    }

    #[tokio::test]
    async fn test_token_expiry_during_operation_clears_state() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let prompt = Arc::new(GatedPrompt::new());
        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        let state = AppState::new(&config, store.clone(), prompt.clone());
        state
            .session
            .save("abc123", r#"{"nama":"Budi","id_karyawan":7}"#, Some("7"))
            .await
            .unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired, Login ulang" })))
            .mount(&server)
            .await;

        let (a, b) = tokio::join!(profile(&state), overtime_recap(&state, december()));
        assert_eq!(a.unwrap_err().invalidation(), Some(crate::session::Invalidation::TokenExpired));
        assert_eq!(b.unwrap_err().invalidation(), Some(crate::session::Invalidation::TokenExpired));

        prompt.release();
        state.session.settle().await;
        assert_eq!(prompt.shown(), 1);
        assert!(store.is_empty().await);

        // The wiped session is noticed before anything is sent
        let before = server.received_requests().await.unwrap().len();
        assert!(matches!(profile(&state).await, Err(ApiError::NotLoggedIn)));
        assert!(state.current.read().await.is_none());
        assert_eq!(server.received_requests().await.unwrap().len(), before);
    }
}
