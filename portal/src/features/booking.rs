//! Appointment booking form.

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::api::models::{BookAppointmentPayload, BookingResponse};
use crate::errors::{PortalError, Result};
use crate::navigation::Route;
use crate::services::PortalQueries;

pub const MISSING_FIELDS: &str = "Please fill in all required fields";

/// Slots offered by the booking page.
pub const TIME_SLOTS: [&str; 6] = [
    "09:00 AM", "10:00 AM", "11:00 AM", "02:00 PM", "03:00 PM", "04:00 PM",
];

pub const VISIT_REASONS: [&str; 7] = [
    "Follow Up",
    "Consultation",
    "Routine Check Up",
    "Emergency",
    "Lab Results Review",
    "Vaccination",
    "Other",
];

/// Raw form state. Everything except `hospital_group_id` and `notes` is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    pub city_id: Option<String>,
    pub hospital_id: Option<String>,
    pub hospital_group_id: Option<String>,
    pub department: Option<String>,
    pub doctor_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl BookingForm {
    /// Checks the form and builds the request body. `today` bounds the date.
    pub fn validate(&self, today: NaiveDate) -> Result<BookAppointmentPayload> {
        let (
            Some(city_id),
            Some(hospital_id),
            Some(_department),
            Some(doctor_id),
            Some(date),
            Some(time),
            Some(reason),
        ) = (
            filled(&self.city_id),
            filled(&self.hospital_id),
            filled(&self.department),
            filled(&self.doctor_id),
            self.date,
            filled(&self.time),
            filled(&self.reason),
        )
        else {
            return Err(PortalError::Validation(MISSING_FIELDS.to_string()));
        };

        if date < today {
            return Err(PortalError::Validation(
                "Appointment date cannot be in the past".to_string(),
            ));
        }

        let reason = match filled(&self.notes) {
            Some(notes) => format!("{}: {}", reason, notes),
            None => reason.to_string(),
        };

        Ok(BookAppointmentPayload {
            doctor_id: doctor_id.to_string(),
            hospital_id: hospital_id.to_string(),
            hospital_group_id: filled(&self.hospital_group_id).map(str::to_string),
            city_id: city_id.to_string(),
            date,
            time: time.to_string(),
            reason: Some(reason),
        })
    }
}

/// Validates locally, books, and sends the user to the dashboard on success.
pub async fn submit(queries: &PortalQueries, form: &BookingForm) -> Result<BookingResponse> {
    let payload = form.validate(Local::now().date_naive())?;
    let response = queries.book_appointment(&payload).await?;
    if response.success == Some(false) {
        return Err(PortalError::Api {
            status: response.status,
            message: response
                .message
                .unwrap_or_else(|| "Appointment could not be booked".to_string()),
        });
    }
    info!(
        "Booked appointment with {} on {} at {}",
        payload.doctor_id, payload.date, payload.time
    );
    queries.http().navigator().navigate(Route::Dashboard);
    Ok(response)
}

fn filled(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
