//! Doctor-side endpoints: dashboard metrics and appointment work queues.

use super::models::{ApiAck, Appointment, DoctorDashboard, Listing, Pagination, Payload};
use crate::errors::Result;
use crate::http::HttpClient;

pub async fn dashboard(http: &HttpClient) -> Result<DoctorDashboard> {
    let dashboard: Payload<DoctorDashboard> = http.get("/doctor/dashboard").await?;
    Ok(dashboard.into_inner())
}

pub async fn pending_appointments(
    http: &HttpClient,
    pagination: &Pagination,
) -> Result<Listing<Appointment>> {
    let listing: Payload<Listing<Appointment>> = http
        .get_with_query("/doctor/pending-appointments", pagination)
        .await?;
    Ok(listing.into_inner())
}

pub async fn todays_schedule(http: &HttpClient) -> Result<Vec<Appointment>> {
    let listing: Payload<Listing<Appointment>> = http.get("/doctor/todays-schedule").await?;
    Ok(listing.into_inner().into_items())
}

pub async fn complete_appointment(http: &HttpClient, appointment_id: &str) -> Result<ApiAck> {
    http.put_empty(&format!("/doctor/appointment/{}/complete", appointment_id))
        .await
}
