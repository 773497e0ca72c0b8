//! Monthly overtime recap.

use super::client::ApiClient;
use super::error::ApiError;
use super::request::ApiRequest;
use super::types::{ApiEnvelope, OvertimeRecord};
use crate::period::{self, MonthPeriod};

const APPROVED: &str = "approved";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OvertimeTotals {
    pub count: usize,
    pub minutes: u32,
    pub pay: f64,
}

impl OvertimeTotals {
    /// Total duration as `"{h}j {m}m"`.
    pub fn duration(&self) -> String {
        period::format_minutes(self.minutes)
    }
}

#[derive(Debug, Clone)]
pub struct OvertimeRecap {
    pub month: MonthPeriod,
    pub records: Vec<OvertimeRecord>,
    pub totals: OvertimeTotals,
}

impl OvertimeRecap {
    /// Keep approved records only and total them.
    pub fn new(month: MonthPeriod, records: Vec<OvertimeRecord>) -> Self {
        let records: Vec<_> = records.into_iter().filter(|r| r.status_lembur == APPROVED).collect();
        let totals = OvertimeTotals {
            count: records.len(),
            minutes: records.iter().map(|r| r.menit_lembur).sum(),
            pay: records.iter().map(|r| r.total_bayaran).sum(),
        };
        Self { month, records, totals }
    }
}

/// Approved overtime of one employee in one month.
///
/// GET /lembur?id_karyawan=&start_date=&end_date= with `YYYY-MM-DD` dates.
pub async fn recap(client: &ApiClient, employee_id: &str, month: MonthPeriod) -> Result<OvertimeRecap, ApiError> {
    let request = ApiRequest::get("/lembur")
        .query("id_karyawan", employee_id)
        .query("start_date", period::format_ymd(month.first_day()))
        .query("end_date", period::format_ymd(month.last_day()));
    let envelope: ApiEnvelope<Vec<OvertimeRecord>> = client.send_json(request).await?;
    Ok(OvertimeRecap::new(month, envelope.data.unwrap_or_default()))
}
