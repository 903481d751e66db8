use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleType {
    #[serde(rename = "idLoaiXe")]
    pub id: i32,
    #[serde(rename = "TenLoai")]
    pub name: String,
    #[serde(rename = "NhanHieu", default)]
    pub brand: Option<String>,
    #[serde(rename = "HinhAnh", default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    #[serde(rename = "idXe")]
    pub id: i32,
    #[serde(rename = "TenXe")]
    pub name: String,
    #[serde(rename = "GiaXe", default)]
    pub price: Option<Decimal>,
    #[serde(rename = "HinhAnh", default)]
    pub image: Option<String>,
    #[serde(rename = "idLoaiXe", default)]
    pub vehicle_type_id: Option<i32>,
}

/// Vehicle type with the number of vehicles filed under it.
#[derive(Debug, Clone, FromRow)]
pub struct VehicleTypeWithCount {
    pub id: i32,
    pub name: String,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub vehicle_count: i64,
}
