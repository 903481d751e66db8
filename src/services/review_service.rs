use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::review::{Review, ReviewRow};

const REVIEW_SELECT: &str = "SELECT r.id, r.appointment_id, r.user_id, r.vehicle_id, r.rating, \
     r.content, r.reviewed_at, r.hidden, u.full_name AS author_name, u.avatar AS author_avatar \
     FROM reviews r LEFT JOIN users u ON u.id = r.user_id";

#[derive(Clone)]
pub struct ReviewService {
    pool: PgPool,
}

impl ReviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every review of the vehicle, hidden ones included, newest first.
    /// Callers decide what to show.
    pub async fn list_for_vehicle(&self, vehicle_id: i32) -> Result<Vec<Review>> {
        let query = format!("{} WHERE r.vehicle_id = $1 ORDER BY r.reviewed_at DESC, r.id DESC", REVIEW_SELECT);
        let rows = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(vehicle_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    pub async fn set_visibility(&self, id: i32, hidden: bool) -> Result<Review> {
        let updated = sqlx::query_scalar::<_, i32>("UPDATE reviews SET hidden = $2 WHERE id = $1 RETURNING id")
            .bind(id)
            .bind(hidden)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Review {} not found", id)))?;

        let query = format!("{} WHERE r.id = $1", REVIEW_SELECT);
        let row = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(updated)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(review_id = id, hidden, "review visibility changed");
        Ok(row.into())
    }
}
