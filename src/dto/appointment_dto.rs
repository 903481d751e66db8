use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::services::appointment_service::AppointmentList;
use crate::utils::validation::{validate_location, validate_phone};

/// Body of both the create and the update endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AppointmentPayload {
    #[serde(rename = "idLichHen", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(rename = "TenKhachHang")]
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    #[serde(rename = "Sdt")]
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[serde(rename = "Email")]
    #[validate(email)]
    pub email: String,
    #[serde(rename = "idXe")]
    pub vehicle_id: i32,
    #[serde(rename = "idLoaiXe")]
    pub vehicle_type_id: i32,
    #[serde(rename = "NgayHen")]
    pub appointment_date: DateTime<Utc>,
    #[serde(rename = "GioHen")]
    pub appointment_time: SlotValue,
    #[serde(rename = "DiaDiem")]
    #[validate(custom(function = "validate_location"))]
    pub location: String,
    #[serde(rename = "NoiDung")]
    #[validate(length(min = 1))]
    pub notes: String,
}

/// `GioHen` as sent over the wire: the combined instant, or the 12-hour
/// display label older storefront pages still submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Instant(DateTime<Utc>),
    Label(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdatePayload {
    #[serde(rename = "trangThai")]
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppointmentListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentListResponse {
    pub items: Vec<Appointment>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<AppointmentList> for AppointmentListResponse {
    fn from(value: AppointmentList) -> Self {
        Self {
            items: value.items,
            total: value.total,
            page: value.page,
            per_page: value.per_page,
            total_pages: value.total_pages,
        }
    }
}
