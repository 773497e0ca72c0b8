//! Request and response types for the employee self-service backend.
//!
//! The backend speaks snake_case JSON with Indonesian field names. Ids and
//! amounts sometimes arrive as numbers and sometimes as strings, so those
//! fields go through `lenient`.

use serde::{Deserialize, Serialize};

/// Deserialize a value that may be a JSON string or a JSON number.
pub mod lenient {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    impl Raw {
        fn into_text(self) -> String {
            match self {
                Raw::Text(s) => s.trim().to_string(),
                Raw::Number(n) => n.to_string(),
            }
        }
    }

    /// `null` and `""` become `T::default()`.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Default,
        T::Err: Display,
    {
        option(deserializer).map(Option::unwrap_or_default)
    }

    /// Any `Deserialize` value where `null` means `T::default()`.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Like `deserialize`, but `null` and `""` become `None`.
    pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => {
                let text = raw.into_text();
                if text.is_empty() {
                    Ok(None)
                } else {
                    text.parse().map(Some).map_err(D::Error::custom)
                }
            }
        }
    }
}

/// Standard response wrapper: `{ "data": ..., "message": ... }`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Login request body sent to POST /auth/login/karyawan.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Fields read from the login response. The whole response is persisted as
/// the stored user record.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub nama: String,
    #[serde(default, deserialize_with = "lenient::option")]
    pub id_karyawan: Option<String>,
}

/// Leave categories accepted by POST /perizinan-new/ajukan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveKind {
    /// Permission leave ("izin").
    Izin,
    /// Sick leave ("sakit").
    Sakit,
    /// Annual leave ("cuti").
    Cuti,
}

impl LeaveKind {
    /// Backend `id_jenis` value.
    pub fn id(&self) -> u32 {
        match self {
            LeaveKind::Izin => 3,
            LeaveKind::Sakit => 4,
            LeaveKind::Cuti => 5,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            3 => Some(LeaveKind::Izin),
            4 => Some(LeaveKind::Sakit),
            5 => Some(LeaveKind::Cuti),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeaveKind::Izin => "Izin",
            LeaveKind::Sakit => "Sakit",
            LeaveKind::Cuti => "Cuti",
        }
    }
}

/// Device location attached to check-in/check-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One day from GET /rekapan/absensi/detail.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceDay {
    /// Date as `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub tanggal: String,
    /// `regular`, `libur`, ...
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status_hari: String,
    /// `Hadir`, `Tidak Hadir`, or a leave label.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub nama_status: String,
}

/// Approved-or-not leave entry from GET /perizinan-new.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRecord {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id_izin: String,
    #[serde(default, deserialize_with = "lenient::option")]
    pub id_jenis: Option<u32>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub tgl_mulai: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub tgl_selesai: String,
    #[serde(default)]
    pub keterangan: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status_izin: String,
}

impl LeaveRecord {
    pub fn kind(&self) -> Option<LeaveKind> {
        self.id_jenis.and_then(LeaveKind::from_id)
    }
}

/// The caller's own leave request from GET /izin/saya.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRequestRecord {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id_izin: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub nama_izin: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub tgl_mulai: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub tgl_selesai: String,
    #[serde(default)]
    pub keterangan: Option<String>,
    /// `approved`, `rejected`, anything else is pending.
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status_approval: String,
    #[serde(default)]
    pub alasan_penolakan: Option<String>,
}

/// Overtime entry from GET /lembur.
#[derive(Debug, Clone, Deserialize)]
pub struct OvertimeRecord {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id_lembur: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub tanggal: String,
    #[serde(default)]
    pub keterangan: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub jam_mulai: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub jam_selesai: String,
    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub menit_lembur: u32,
    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub total_bayaran: f64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub status_lembur: String,
}

/// Employee profile from GET /pegawai/{id}.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeProfile {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub nama: String,
    #[serde(default)]
    pub nama_panggilan: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub nip: Option<String>,
    #[serde(default)]
    pub jenis: Option<String>,
    #[serde(default)]
    pub tipe: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub gaji_pokok: Option<f64>,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub no_rekening: Option<String>,
}
