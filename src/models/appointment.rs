use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    #[serde(rename = "idLichHen")]
    pub id: i32,
    #[serde(rename = "TenKhachHang")]
    pub customer_name: String,
    #[serde(rename = "Sdt")]
    pub phone: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "idXe")]
    pub vehicle_id: i32,
    #[serde(rename = "idLoaiXe")]
    pub vehicle_type_id: i32,
    #[serde(rename = "NgayHen")]
    pub appointment_date: DateTime<Utc>,
    #[serde(rename = "GioHen")]
    pub appointment_time: DateTime<Utc>,
    #[serde(rename = "DiaDiem")]
    pub location: String,
    #[serde(rename = "NoiDung")]
    pub notes: String,
    #[serde(rename = "trangThai", default)]
    #[sqlx(try_from = "String")]
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Approved,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown appointment status '{0}'")]
pub struct UnknownStatus(pub String);

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Approved,
        AppointmentStatus::Completed,
        AppointmentStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Approved => "APPROVED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Rejected => "REJECTED",
        }
    }

    /// Approved and completed appointments can no longer be edited.
    pub fn is_locked(&self) -> bool {
        matches!(self, AppointmentStatus::Approved | AppointmentStatus::Completed)
    }

    /// Transitions available to the staff approval workflow.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Pending, AppointmentStatus::Approved)
                | (AppointmentStatus::Pending, AppointmentStatus::Rejected)
                | (AppointmentStatus::Approved, AppointmentStatus::Completed)
        )
    }

    pub fn locked_message(&self) -> Option<&'static str> {
        match self {
            AppointmentStatus::Approved => Some("This appointment has been approved and can no longer be edited"),
            AppointmentStatus::Completed => Some("This appointment has been completed and can no longer be edited"),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for AppointmentStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Showrooms where test drives start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    PhamHung,
    NguyenVanLinh,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::PhamHung, Location::NguyenVanLinh];

    pub fn address(&self) -> &'static str {
        match self {
            Location::PhamHung => "03 Phạm Hùng, Hoà Châu, Cẩm Lệ, Đà Nẵng",
            Location::NguyenVanLinh => "115 Đ. Nguyễn Văn Linh, Nam Dương, Hải Châu, Đà Nẵng",
        }
    }

    pub fn parse(address: &str) -> Option<Location> {
        let address = address.trim();
        Location::ALL.into_iter().find(|l| l.address() == address)
    }
}
