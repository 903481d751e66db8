use chrono::{DateTime, Local, Utc};
use sqlx::PgPool;

use crate::dto::appointment_dto::{AppointmentListQuery, AppointmentPayload, SlotValue};
use crate::error::{Error, Result};
use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::utils::time_slot::TimeSlot;

const APPOINTMENT_COLUMNS: &str = "id, customer_name, phone, email, vehicle_id, vehicle_type_id, \
     appointment_date, appointment_time, location, notes, status, created_at, updated_at";

#[derive(Clone)]
pub struct AppointmentService {
    pool: PgPool,
}

pub struct AppointmentList {
    pub items: Vec<Appointment>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Resolves `GioHen` to the stored instant. A label is combined with the
/// local calendar date of `appointment_date`; an instant must already sit on
/// an offered slot.
pub fn normalize_slot(appointment_date: DateTime<Utc>, value: &SlotValue) -> Result<DateTime<Utc>> {
    match value {
        SlotValue::Instant(at) => {
            if TimeSlot::from_instant(*at).is_none() {
                return Err(Error::BadRequest(format!(
                    "GioHen {} is not an offered time slot",
                    at.to_rfc3339()
                )));
            }
            let day = appointment_date.with_timezone(&Local).date_naive();
            let slot_day = at.with_timezone(&Local).date_naive();
            if slot_day != day {
                return Err(Error::BadRequest(format!(
                    "GioHen falls on {} but NgayHen is {}",
                    slot_day, day
                )));
            }
            Ok(*at)
        }
        SlotValue::Label(label) => {
            let slot = TimeSlot::parse_label(label)
                .map_err(|e| Error::BadRequest(format!("GioHen: {}", e)))?;
            let date = appointment_date.with_timezone(&Local).date_naive();
            slot.on(date).ok_or_else(|| {
                Error::BadRequest(format!("GioHen {} does not exist on {}", label, date))
            })
        }
    }
}

impl AppointmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// New bookings always start out pending, whatever the caller sent.
    pub async fn create(&self, payload: AppointmentPayload) -> Result<Appointment> {
        let appointment_time = normalize_slot(payload.appointment_date, &payload.appointment_time)?;
        self.ensure_vehicle_matches(payload.vehicle_id, payload.vehicle_type_id).await?;

        let query = format!(
            "INSERT INTO appointments (
                customer_name, phone, email, vehicle_id, vehicle_type_id,
                appointment_date, appointment_time, location, notes, status
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            RETURNING {}",
            APPOINTMENT_COLUMNS
        );
        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(&payload.customer_name)
            .bind(&payload.phone)
            .bind(&payload.email)
            .bind(payload.vehicle_id)
            .bind(payload.vehicle_type_id)
            .bind(payload.appointment_date)
            .bind(appointment_time)
            .bind(&payload.location)
            .bind(&payload.notes)
            .bind(AppointmentStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(appointment_id = appointment.id, vehicle_id = appointment.vehicle_id, "appointment booked");
        Ok(appointment)
    }

    /// Rewrites the customer-editable fields. The lock check and the write
    /// happen in one statement, so a record approved concurrently is never
    /// overwritten.
    pub async fn update(&self, id: i32, payload: AppointmentPayload) -> Result<Appointment> {
        let appointment_time = normalize_slot(payload.appointment_date, &payload.appointment_time)?;
        self.ensure_vehicle_matches(payload.vehicle_id, payload.vehicle_type_id).await?;

        let query = format!(
            "UPDATE appointments
             SET customer_name = $2,
                 phone = $3,
                 email = $4,
                 vehicle_id = $5,
                 vehicle_type_id = $6,
                 appointment_date = $7,
                 appointment_time = $8,
                 location = $9,
                 notes = $10,
                 updated_at = NOW()
             WHERE id = $1 AND status NOT IN ($11, $12)
             RETURNING {}",
            APPOINTMENT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(&payload.customer_name)
            .bind(&payload.phone)
            .bind(&payload.email)
            .bind(payload.vehicle_id)
            .bind(payload.vehicle_type_id)
            .bind(payload.appointment_date)
            .bind(appointment_time)
            .bind(&payload.location)
            .bind(&payload.notes)
            .bind(AppointmentStatus::Approved.as_str())
            .bind(AppointmentStatus::Completed.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(appointment) => Ok(appointment),
            None => Err(self.explain_missed_write(id).await),
        }
    }

    /// The booked vehicle must exist and belong to the booked type.
    async fn ensure_vehicle_matches(&self, vehicle_id: i32, vehicle_type_id: i32) -> Result<()> {
        let matches: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1 AND vehicle_type_id = $2)",
        )
        .bind(vehicle_id)
        .bind(vehicle_type_id)
        .fetch_one(&self.pool)
        .await?;

        if matches {
            Ok(())
        } else {
            Err(Error::BadRequest(format!(
                "idXe {} is not a vehicle of idLoaiXe {}",
                vehicle_id, vehicle_type_id
            )))
        }
    }

    async fn explain_missed_write(&self, id: i32) -> Error {
        match self.get_by_id(id).await {
            Ok(current) => {
                tracing::warn!(appointment_id = id, status = %current.status, "refused edit of locked appointment");
                Error::Conflict(
                    current
                        .status
                        .locked_message()
                        .unwrap_or("Appointment can no longer be edited")
                        .to_string(),
                )
            }
            Err(err) => err,
        }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Appointment> {
        let query = format!("SELECT {} FROM appointments WHERE id = $1", APPOINTMENT_COLUMNS);
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Appointment {} not found", id)))
    }

    pub async fn list(&self, query: AppointmentListQuery) -> Result<AppointmentList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut filters = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(status) = query.status.as_deref().filter(|s| !s.trim().is_empty()) {
            let status: AppointmentStatus = status
                .parse()
                .map_err(|e: crate::models::appointment::UnknownStatus| Error::BadRequest(e.to_string()))?;
            filters.push(format!("status = ${}", args.len() + 1));
            args.push(status.as_str().to_string());
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let first = args.len() + 1;
            filters.push(format!(
                "(customer_name ILIKE ${} OR phone ILIKE ${} OR email ILIKE ${})",
                first,
                first + 1,
                first + 2
            ));
            for _ in 0..3 {
                args.push(format!("%{}%", search));
            }
        }

        let where_clause = if filters.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };

        let items_query = format!(
            "SELECT {}
             FROM appointments
             {}
             ORDER BY appointment_time DESC, id DESC
             LIMIT ${} OFFSET ${}",
            APPOINTMENT_COLUMNS,
            where_clause,
            args.len() + 1,
            args.len() + 2
        );
        let total_query = format!("SELECT COUNT(*) FROM appointments {}", where_clause);

        let mut items_statement = sqlx::query_as::<_, Appointment>(&items_query);
        for value in &args {
            items_statement = items_statement.bind(value);
        }
        let items = items_statement
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query);
        for value in &args {
            total_statement = total_statement.bind(value);
        }
        let total = total_statement.fetch_one(&self.pool).await?;

        Ok(AppointmentList {
            items,
            total,
            page,
            per_page,
            total_pages: total_pages(total, per_page),
        })
    }

    /// Staff approval workflow: PENDING to APPROVED or REJECTED, APPROVED to
    /// COMPLETED.
    pub async fn update_status(&self, id: i32, next: AppointmentStatus) -> Result<Appointment> {
        let current = self.get_by_id(id).await?;
        if !current.status.can_transition_to(next) {
            return Err(Error::Conflict(format!(
                "Cannot move appointment from {} to {}",
                current.status, next
            )));
        }

        let query = format!(
            "UPDATE appointments
             SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status = $3
             RETURNING {}",
            APPOINTMENT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(next.as_str())
            .bind(current.status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::Conflict("Appointment status changed concurrently".to_string()))?;

        tracing::info!(appointment_id = id, from = %current.status, to = %next, "appointment status changed");
        Ok(updated)
    }

    /// Appointments for export, optionally narrowed to `ids` and a search over
    /// customer name, phone and email.
    pub async fn list_for_export(&self, search: Option<&str>, ids: &[i32]) -> Result<Vec<Appointment>> {
        let query = format!(
            "SELECT {}
             FROM appointments
             WHERE ($1::text IS NULL OR customer_name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1)
               AND (cardinality($2::int4[]) = 0 OR id = ANY($2))
             ORDER BY id",
            APPOINTMENT_COLUMNS
        );
        let items = sqlx::query_as::<_, Appointment>(&query)
            .bind(search.map(|s| format!("%{}%", s)))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

fn total_pages(total: i64, per_page: i64) -> i64 {
    ((total as f64) / (per_page as f64)).ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time_slot::local_midnight;
    use chrono::NaiveDate;

    fn march_14() -> (NaiveDate, DateTime<Utc>) {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        (date, local_midnight(date).unwrap())
    }

    #[test]
    fn label_is_combined_with_the_local_date() {
        let (date, midnight) = march_14();
        let at = normalize_slot(midnight, &SlotValue::Label("2:30 PM".into())).unwrap();
        assert_eq!(at, TimeSlot::parse("14:30").unwrap().on(date).unwrap());
    }

    #[test]
    fn instant_on_a_slot_is_kept() {
        let (date, midnight) = march_14();
        let at = TimeSlot::parse("08:30").unwrap().on(date).unwrap();
        assert_eq!(normalize_slot(midnight, &SlotValue::Instant(at)).unwrap(), at);
    }

    #[test]
    fn off_grid_values_are_bad_requests() {
        let (_, midnight) = march_14();
        assert!(matches!(
            normalize_slot(midnight, &SlotValue::Label("7:00 PM".into())),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            normalize_slot(midnight, &SlotValue::Label("half past two".into())),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            normalize_slot(midnight, &SlotValue::Instant(midnight)),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn instant_on_another_day_is_rejected() {
        let (_, midnight) = march_14();
        let later = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let at = TimeSlot::parse("14:30").unwrap().on(later).unwrap();
        match normalize_slot(midnight, &SlotValue::Instant(at)) {
            Err(Error::BadRequest(msg)) => assert!(msg.contains("NgayHen")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }
}
