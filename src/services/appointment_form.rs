use chrono::{Local, NaiveDate};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::dto::appointment_dto::{AppointmentPayload, SlotValue};
use crate::models::appointment::{Appointment, AppointmentStatus, Location};
use crate::models::vehicle::{Vehicle, VehicleType};
use crate::services::storefront_client::StorefrontApi;
use crate::utils::time_slot::{local_midnight, TimeSlot};
use crate::utils::validation::{normalize_phone, phone_length_ok};

pub const PHONE_TRUNCATED_MESSAGE: &str = "phone must be 10-11 digits";
pub const PHONE_LENGTH_MESSAGE: &str = "phone number must have 10 to 11 digits";
pub const LOCKED_MESSAGE: &str = "cannot modify an approved or completed appointment";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong while saving the appointment";
pub const OPTIONS_FAILURE_MESSAGE: &str = "Could not load the vehicle lists";

/// Who is using the form and what they are booking. Supplied by the page
/// instead of being read from a global session.
#[derive(Debug, Clone, Default)]
pub struct FormContext {
    pub user: Option<SessionUser>,
    pub vehicle: Option<VehicleRef>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionUser {
    pub full_name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy)]
pub struct VehicleRef {
    pub vehicle_id: i32,
    pub vehicle_type_id: i32,
}

/// Editable form fields, identified by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    CustomerName,
    Phone,
    Email,
    VehicleId,
    VehicleTypeId,
    Date,
    Time,
    Location,
    Notes,
}

impl FormField {
    pub const REQUIRED: [FormField; 9] = [
        FormField::CustomerName,
        FormField::Phone,
        FormField::Email,
        FormField::VehicleId,
        FormField::VehicleTypeId,
        FormField::Date,
        FormField::Time,
        FormField::Location,
        FormField::Notes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FormField::CustomerName => "TenKhachHang",
            FormField::Phone => "Sdt",
            FormField::Email => "Email",
            FormField::VehicleId => "idXe",
            FormField::VehicleTypeId => "idLoaiXe",
            FormField::Date => "NgayHen",
            FormField::Time => "GioHen",
            FormField::Location => "DiaDiem",
            FormField::Notes => "NoiDung",
        }
    }
}

/// A single edit coming from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Raw phone input; formatting characters are dropped.
    Phone(String),
    /// `YYYY-MM-DD` from a date picker.
    Date(String),
    /// Any other text or select field.
    Field(FormField, String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub customer_name: String,
    pub phone: String,
    pub email: String,
    pub vehicle_id: String,
    pub vehicle_type_id: String,
    pub date: Option<NaiveDate>,
    /// 24-hour `"HH:MM"` slot selection.
    pub time: String,
    pub location: String,
    pub notes: String,
}

impl FormFields {
    fn is_missing(&self, field: FormField) -> bool {
        let blank = |s: &str| s.trim().is_empty();
        match field {
            FormField::CustomerName => blank(&self.customer_name),
            FormField::Phone => blank(&self.phone),
            FormField::Email => blank(&self.email),
            FormField::VehicleId => blank(&self.vehicle_id),
            FormField::VehicleTypeId => blank(&self.vehicle_type_id),
            FormField::Date => self.date.is_none(),
            FormField::Time => TimeSlot::parse(&self.time).is_err(),
            FormField::Location => Location::parse(&self.location).is_none(),
            FormField::Notes => blank(&self.notes),
        }
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::CustomerName => Some(&mut self.customer_name),
            FormField::Email => Some(&mut self.email),
            FormField::VehicleId => Some(&mut self.vehicle_id),
            FormField::VehicleTypeId => Some(&mut self.vehicle_type_id),
            FormField::Time => Some(&mut self.time),
            FormField::Location => Some(&mut self.location),
            FormField::Notes => Some(&mut self.notes),
            FormField::Phone | FormField::Date => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", LOCKED_MESSAGE)]
    Locked,

    #[error("{}", PHONE_LENGTH_MESSAGE)]
    PhoneLength,

    #[error("please fill in: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("the selected date has no local midnight")]
    UnrepresentableDate,

    #[error("a submission is already in progress")]
    SubmissionInFlight,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Network failure, rejection or unreadable response.
    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast-style message for the page to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub appointment: Appointment,
    /// `true` for a new booking, `false` for an edit.
    pub created: bool,
}

struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Backs both the customer booking page and the staff edit dialog. Nothing is
/// sent until [`AppointmentForm::submit`], and a refused submit keeps the
/// entered data.
pub struct AppointmentForm {
    id: Option<i32>,
    status: AppointmentStatus,
    fields: FormFields,
    phone_error: Option<String>,
    notice: Option<Notice>,
    vehicle_types: Vec<VehicleType>,
    vehicles: Vec<Vehicle>,
    in_flight: Arc<AtomicBool>,
}

impl AppointmentForm {
    pub fn initialize(context: &FormContext, record: Option<&Appointment>) -> Self {
        let (id, status, fields) = match record {
            Some(appointment) => (
                Some(appointment.id),
                appointment.status,
                Self::fields_from_record(appointment),
            ),
            None => (None, AppointmentStatus::Pending, Self::fields_from_context(context)),
        };

        Self {
            id,
            status,
            fields,
            phone_error: None,
            notice: None,
            vehicle_types: Vec::new(),
            vehicles: Vec::new(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fields_from_context(context: &FormContext) -> FormFields {
        let mut fields = FormFields::default();
        if let Some(user) = &context.user {
            fields.customer_name = user.full_name.clone();
            fields.phone = normalize_phone(&user.phone).digits;
            fields.email = user.email.clone();
        }
        if let Some(vehicle) = context.vehicle {
            fields.vehicle_id = vehicle.vehicle_id.to_string();
            fields.vehicle_type_id = vehicle.vehicle_type_id.to_string();
        }
        fields
    }

    fn fields_from_record(appointment: &Appointment) -> FormFields {
        FormFields {
            customer_name: appointment.customer_name.clone(),
            phone: appointment.phone.clone(),
            email: appointment.email.clone(),
            vehicle_id: appointment.vehicle_id.to_string(),
            vehicle_type_id: appointment.vehicle_type_id.to_string(),
            date: Some(appointment.appointment_date.with_timezone(&Local).date_naive()),
            time: TimeSlot::from_instant(appointment.appointment_time)
                .map(|slot| slot.to_string())
                .unwrap_or_default(),
            location: appointment.location.clone(),
            notes: appointment.notes.clone(),
        }
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn phone_error(&self) -> Option<&str> {
        self.phone_error.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Inputs render disabled and the submit button is hidden while locked.
    pub fn is_locked(&self) -> bool {
        self.status.is_locked()
    }

    pub fn shows_submit(&self) -> bool {
        !self.is_locked()
    }

    pub fn locked_message(&self) -> Option<&'static str> {
        self.status.locked_message()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn submit_label(&self) -> &'static str {
        match (self.is_submitting(), self.id) {
            (true, _) => "Saving...",
            (false, Some(_)) => "Update",
            (false, None) => "Create",
        }
    }

    pub fn vehicle_types(&self) -> &[VehicleType] {
        &self.vehicle_types
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Fills the vehicle-type and vehicle selectors.
    pub async fn load_options(&mut self, api: &dyn StorefrontApi) {
        let (types, vehicles) = tokio::join!(api.list_vehicle_types(), api.list_vehicles());
        match (types, vehicles) {
            (Ok(types), Ok(vehicles)) => {
                self.vehicle_types = types;
                self.vehicles = vehicles;
            }
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!(error = %err, "failed to load vehicle options");
                self.notify(NoticeKind::Error, OPTIONS_FAILURE_MESSAGE);
            }
        }
    }

    pub fn update_field(&mut self, update: FieldUpdate) -> Result<(), FormError> {
        if self.is_locked() {
            return Err(ValidationError::Locked.into());
        }

        match update {
            FieldUpdate::Phone(raw) => {
                let input = normalize_phone(&raw);
                self.phone_error = input.truncated.then(|| PHONE_TRUNCATED_MESSAGE.to_string());
                self.fields.phone = input.digits;
            }
            FieldUpdate::Date(raw) => {
                self.fields.date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok();
            }
            FieldUpdate::Field(FormField::Phone, raw) => {
                return self.update_field(FieldUpdate::Phone(raw));
            }
            FieldUpdate::Field(FormField::Date, raw) => {
                return self.update_field(FieldUpdate::Date(raw));
            }
            FieldUpdate::Field(field, value) => {
                if let Some(slot) = self.fields.text_mut(field) {
                    *slot = value;
                }
            }
        }
        Ok(())
    }

    /// Field names that are empty, unset, or not one of the offered choices.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        FormField::REQUIRED
            .iter()
            .filter(|field| self.fields.is_missing(**field))
            .map(FormField::name)
            .collect()
    }

    fn validate(&self) -> Result<AppointmentPayload, ValidationError> {
        if self.is_locked() {
            return Err(ValidationError::Locked);
        }
        if !phone_length_ok(&self.fields.phone) {
            return Err(ValidationError::PhoneLength);
        }
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        self.compose()
    }

    fn compose(&self) -> Result<AppointmentPayload, ValidationError> {
        let fields = &self.fields;
        let vehicle_id = parse_id(&fields.vehicle_id, FormField::VehicleId)?;
        let vehicle_type_id = parse_id(&fields.vehicle_type_id, FormField::VehicleTypeId)?;
        let date = fields
            .date
            .ok_or_else(|| ValidationError::MissingFields(vec![FormField::Date.name()]))?;
        let slot = TimeSlot::parse(&fields.time)
            .map_err(|_| ValidationError::MissingFields(vec![FormField::Time.name()]))?;

        let appointment_date = local_midnight(date).ok_or(ValidationError::UnrepresentableDate)?;
        let appointment_time = slot.on(date).ok_or(ValidationError::UnrepresentableDate)?;

        Ok(AppointmentPayload {
            id: self.id,
            customer_name: fields.customer_name.trim().to_string(),
            phone: fields.phone.clone(),
            email: fields.email.trim().to_string(),
            vehicle_id,
            vehicle_type_id,
            appointment_date,
            appointment_time: SlotValue::Instant(appointment_time),
            location: fields.location.trim().to_string(),
            notes: fields.notes.clone(),
        })
    }

    /// Validates, then creates or updates the appointment. Validation
    /// failures never reach the network.
    pub async fn submit(&mut self, api: &dyn StorefrontApi) -> Result<SubmitOutcome, FormError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(ValidationError::SubmissionInFlight.into());
        };

        let payload = match self.validate() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(error = %err, "appointment form refused submission");
                self.notify(NoticeKind::Error, &err.to_string());
                return Err(err.into());
            }
        };

        let created = self.id.is_none();
        let result = match self.id {
            None => api.create_appointment(payload).await,
            Some(id) => api.update_appointment(id, payload).await,
        };

        match result {
            Ok(appointment) => {
                self.id = Some(appointment.id);
                self.status = appointment.status;
                let message = if created {
                    "Test drive appointment created"
                } else {
                    "Test drive appointment updated"
                };
                self.notify(NoticeKind::Success, message);
                tracing::info!(appointment_id = appointment.id, created, "appointment saved");
                Ok(SubmitOutcome { appointment, created })
            }
            Err(err) => {
                let message = err
                    .server_message()
                    .unwrap_or(GENERIC_FAILURE_MESSAGE)
                    .to_string();
                tracing::warn!(error = %err, "appointment submission failed");
                self.notify(NoticeKind::Error, &message);
                Err(FormError::Transport(message))
            }
        }
    }

    fn notify(&mut self, kind: NoticeKind, message: &str) {
        self.notice = Some(Notice {
            kind,
            message: message.to_string(),
        });
    }
}

fn parse_id(raw: &str, field: FormField) -> Result<i32, ValidationError> {
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber(field.name()))
}
