//! Monthly attendance recap.

use super::client::ApiClient;
use super::error::ApiError;
use super::request::ApiRequest;
use super::types::{ApiEnvelope, AttendanceDay};
use crate::period::{self, MonthPeriod};

const PRESENT: &str = "Hadir";
const ABSENT: &str = "Tidak Hadir";

/// Day counts. Any status other than present or absent counts as excused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub present: usize,
    pub absent: usize,
    pub excused: usize,
}

impl AttendanceSummary {
    pub fn tally(days: &[AttendanceDay]) -> Self {
        days.iter().fold(Self::default(), |mut acc, day| {
            match day.nama_status.as_str() {
                PRESENT => acc.present += 1,
                ABSENT => acc.absent += 1,
                _ => acc.excused += 1,
            }
            acc
        })
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceRecap {
    pub month: MonthPeriod,
    pub days: Vec<AttendanceDay>,
    pub summary: AttendanceSummary,
}

/// The caller's attendance in one month.
///
/// GET /rekapan/absensi/detail?start_date=&end_date= with `DD-MM-YYYY` dates.
/// The employee is taken from the bearer token.
pub async fn attendance(client: &ApiClient, month: MonthPeriod) -> Result<AttendanceRecap, ApiError> {
    let request = ApiRequest::get("/rekapan/absensi/detail")
        .query("start_date", period::format_dmy(month.first_day()))
        .query("end_date", period::format_dmy(month.last_day()));
    let envelope: ApiEnvelope<Vec<AttendanceDay>> = client.send_json(request).await?;
    let days = envelope.data.unwrap_or_default();
    let summary = AttendanceSummary::tally(&days);
    Ok(AttendanceRecap { month, days, summary })
}
