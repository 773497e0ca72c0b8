//! Leave requests: submission, the caller's own history, and the monthly
//! approved-leave recap.

use chrono::NaiveDate;
use reqwest::multipart::Form;

use super::client::ApiClient;
use super::error::ApiError;
use super::request::{ApiRequest, Attachment};
use super::types::{ApiEnvelope, LeaveKind, LeaveRecord, LeaveRequestRecord};
use crate::period::{self, MonthPeriod};

const APPROVED: &str = "approved";
const REJECTED: &str = "rejected";

/// A new leave request.
#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub kind: LeaveKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub remarks: String,
    pub attachment: Option<Attachment>,
}

impl LeaveApplication {
    fn into_form(self) -> Result<Form, ApiError> {
        if self.end < self.start {
            return Err(ApiError::InvalidRequest(
                "Tanggal selesai tidak boleh sebelum tanggal mulai".to_string(),
            ));
        }

        let mut form = Form::new()
            .text("id_jenis", self.kind.id().to_string())
            .text("tgl_mulai", period::format_dmy(self.start))
            .text("tgl_selesai", period::format_dmy(self.end))
            .text("keterangan", self.remarks);
        if let Some(file) = self.attachment {
            form = form.part("file", file.into_part()?);
        }
        Ok(form)
    }
}

/// Submit a leave request.
///
/// POST /perizinan-new/ajukan as multipart. An end date before the start
/// date is rejected without contacting the server.
pub async fn submit(client: &ApiClient, application: LeaveApplication) -> Result<Option<String>, ApiError> {
    let kind = application.kind;
    let form = application.into_form()?;
    let envelope: ApiEnvelope<serde_json::Value> = client
        .send_json(ApiRequest::post("/perizinan-new/ajukan").multipart(form))
        .await?;
    log::info!("{} request submitted", kind.label());
    Ok(envelope.message)
}

/// Counts over the caller's leave requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaveHistorySummary {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
}

#[derive(Debug, Clone)]
pub struct LeaveHistory {
    pub records: Vec<LeaveRequestRecord>,
    pub summary: LeaveHistorySummary,
}

impl LeaveHistory {
    /// Keep requests whose start date falls in `month`, or all when `None`.
    /// Records with an unparsable start date are dropped by a month filter.
    pub fn new(records: Vec<LeaveRequestRecord>, month: Option<MonthPeriod>) -> Self {
        let records: Vec<_> = match month {
            None => records,
            Some(month) => records
                .into_iter()
                .filter(|r| {
                    period::parse_date(&r.tgl_mulai)
                        .map(|d| d >= month.first_day() && d <= month.last_day())
                        .unwrap_or(false)
                })
                .collect(),
        };

        let mut summary = LeaveHistorySummary {
            total: records.len(),
            ..Default::default()
        };
        for record in &records {
            match record.status_approval.as_str() {
                APPROVED => summary.approved += 1,
                REJECTED => summary.rejected += 1,
                _ => summary.pending += 1,
            }
        }

        Self { records, summary }
    }
}

/// The caller's own leave requests.
///
/// GET /izin/saya
pub async fn history(client: &ApiClient, month: Option<MonthPeriod>) -> Result<LeaveHistory, ApiError> {
    let envelope: ApiEnvelope<Vec<LeaveRequestRecord>> = client.get("/izin/saya").await?;
    Ok(LeaveHistory::new(envelope.data.unwrap_or_default(), month))
}

/// One approved leave with its inclusive day count.
#[derive(Debug, Clone)]
pub struct ApprovedLeave {
    pub record: LeaveRecord,
    /// `None` when either date does not parse.
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeaveRecapSummary {
    pub izin: usize,
    pub sakit: usize,
    pub cuti: usize,
}

#[derive(Debug, Clone)]
pub struct LeaveRecap {
    pub month: MonthPeriod,
    pub entries: Vec<ApprovedLeave>,
    pub summary: LeaveRecapSummary,
}

impl LeaveRecap {
    /// Keep approved records only and tally them by kind.
    pub fn new(month: MonthPeriod, records: Vec<LeaveRecord>) -> Self {
        let mut summary = LeaveRecapSummary::default();
        let entries: Vec<_> = records
            .into_iter()
            .filter(|r| r.status_izin == APPROVED)
            .map(|record| {
                match record.kind() {
                    Some(LeaveKind::Izin) => summary.izin += 1,
                    Some(LeaveKind::Sakit) => summary.sakit += 1,
                    Some(LeaveKind::Cuti) => summary.cuti += 1,
                    None => {}
                }
                let days = match (period::parse_date(&record.tgl_mulai), period::parse_date(&record.tgl_selesai)) {
                    (Ok(start), Ok(end)) => Some(period::inclusive_days(start, end)),
                    _ => None,
                };
                ApprovedLeave { record, days }
            })
            .collect();

        Self { month, entries, summary }
    }
}

/// Approved leave of one employee in one month.
///
/// GET /perizinan-new?id_karyawan=&start_date=&end_date= with `YYYY-MM-DD` dates.
pub async fn recap(client: &ApiClient, employee_id: &str, month: MonthPeriod) -> Result<LeaveRecap, ApiError> {
    let request = ApiRequest::get("/perizinan-new")
        .query("id_karyawan", employee_id)
        .query("start_date", period::format_ymd(month.first_day()))
        .query("end_date", period::format_ymd(month.last_day()));
    let envelope: ApiEnvelope<Vec<LeaveRecord>> = client.send_json(request).await?;
    Ok(LeaveRecap::new(month, envelope.data.unwrap_or_default()))
}
