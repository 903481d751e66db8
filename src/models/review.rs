use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "idDanhGia")]
    pub id: i32,
    #[serde(rename = "idLichHen")]
    pub appointment_id: i32,
    #[serde(rename = "idUser")]
    pub user_id: i32,
    #[serde(rename = "idXe")]
    pub vehicle_id: i32,
    #[serde(rename = "SoSao")]
    pub rating: i32,
    #[serde(rename = "NoiDung", default)]
    pub content: String,
    #[serde(rename = "NgayDanhGia")]
    pub reviewed_at: DateTime<Utc>,
    /// `true` hides the review from customers and from every aggregate.
    #[serde(rename = "AnHien", default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ReviewAuthor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    #[serde(rename = "Hoten")]
    pub full_name: String,
    #[serde(rename = "Avatar", default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: i32,
    pub appointment_id: i32,
    pub user_id: i32,
    pub vehicle_id: i32,
    pub rating: i32,
    pub content: String,
    pub reviewed_at: DateTime<Utc>,
    pub hidden: bool,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        let user = row.author_name.map(|full_name| ReviewAuthor {
            full_name,
            avatar: row.author_avatar,
        });
        Self {
            id: row.id,
            appointment_id: row.appointment_id,
            user_id: row.user_id,
            vehicle_id: row.vehicle_id,
            rating: row.rating,
            content: row.content,
            reviewed_at: row.reviewed_at,
            hidden: row.hidden,
            user,
        }
    }
}
