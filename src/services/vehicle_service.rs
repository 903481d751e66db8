use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::vehicle::{Vehicle, VehicleType, VehicleTypeWithCount};

#[derive(Clone)]
pub struct VehicleService {
    pool: PgPool,
}

impl VehicleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_types(&self) -> Result<Vec<VehicleType>> {
        let items = sqlx::query_as::<_, VehicleType>(
            "SELECT id, name, brand, image FROM vehicle_types ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let items = sqlx::query_as::<_, Vehicle>(
            "SELECT id, name, price, image, vehicle_type_id FROM vehicles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn get_vehicle(&self, id: i32) -> Result<Vehicle> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT id, name, price, image, vehicle_type_id FROM vehicles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Vehicle {} not found", id)))
    }

    /// Vehicle types with their vehicle counts, filtered by a search over
    /// name and brand and by explicit ids.
    pub async fn list_types_for_export(
        &self,
        search: Option<&str>,
        ids: &[i32],
    ) -> Result<Vec<VehicleTypeWithCount>> {
        let items = sqlx::query_as::<_, VehicleTypeWithCount>(
            r#"
            SELECT t.id, t.name, t.brand, t.image, COUNT(v.id) AS vehicle_count
            FROM vehicle_types t
            LEFT JOIN vehicles v ON v.vehicle_type_id = t.id
            WHERE ($1::text IS NULL OR t.name ILIKE $1 OR t.brand ILIKE $1)
              AND (cardinality($2::int4[]) = 0 OR t.id = ANY($2))
            GROUP BY t.id, t.name, t.brand, t.image
            ORDER BY t.id
            "#,
        )
        .bind(search.map(|s| format!("%{}%", s)))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list_vehicles_for_export(&self, search: Option<&str>, ids: &[i32]) -> Result<Vec<Vehicle>> {
        let items = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, name, price, image, vehicle_type_id
            FROM vehicles
            WHERE ($1::text IS NULL OR name ILIKE $1)
              AND (cardinality($2::int4[]) = 0 OR id = ANY($2))
            ORDER BY id
            "#,
        )
        .bind(search.map(|s| format!("%{}%", s)))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}
