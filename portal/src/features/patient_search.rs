//! Patient lookup for clinical staff, gated on `patient_search` or
//! `patient_read` (or the `all` wildcard).

use tracing::debug;

use crate::api::models::{Appointment, AppointmentSearch};
use crate::auth::permissions::{PermissionGate, PATIENT_READ, PATIENT_SEARCH};
use crate::errors::Result;
use crate::services::PortalQueries;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientSearchQuery {
    pub department: Option<String>,
    pub doctor_id: Option<String>,
    pub patient_name: Option<String>,
    /// Registered medical number, matched against the appointment's patient id.
    pub rmn: Option<String>,
}

impl PatientSearchQuery {
    fn matches(&self, appointment: &Appointment) -> bool {
        let name_ok = match non_empty(&self.patient_name) {
            Some(wanted) => appointment
                .patient_name
                .as_deref()
                .map(|name| name.to_lowercase().contains(&wanted.to_lowercase()))
                .unwrap_or(false),
            None => true,
        };
        let rmn_ok = match non_empty(&self.rmn) {
            Some(wanted) => appointment.patient_id.as_deref() == Some(wanted),
            None => true,
        };
        let department_ok = match non_empty(&self.department) {
            Some(wanted) => appointment
                .extra
                .get("department")
                .and_then(|d| d.as_str())
                .map(|d| d.eq_ignore_ascii_case(wanted))
                .unwrap_or(false),
            None => true,
        };
        name_ok && rmn_ok && department_ok
    }
}

/// Searches appointments and keeps those whose patient matches the query.
///
/// Fails with `Forbidden` before any request when the gate denies access.
pub async fn search(
    queries: &PortalQueries,
    gate: &PermissionGate,
    query: &PatientSearchQuery,
) -> Result<Vec<Appointment>> {
    gate.require_any(&[PATIENT_SEARCH, PATIENT_READ])?;

    let search = AppointmentSearch {
        doctor_id: non_empty(&query.doctor_id).map(str::to_string),
        ..AppointmentSearch::default()
    };
    let listing = queries.search_appointments(&search).await?;
    let found: Vec<Appointment> = listing
        .into_items()
        .into_iter()
        .filter(|a| query.matches(a))
        .collect();
    debug!("Patient search matched {} appointments", found.len());
    Ok(found)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
