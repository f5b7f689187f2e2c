//! Admin endpoints: dashboard, confirmation audit trail, disease templates and
//! appointment management including QR / numeric-code check-in.

use super::models::{
    AdminDashboardStats, AllAppointmentsQuery, ApiAck, Appointment, AppointmentSearch,
    CheckInMethod, ConfirmRequest, ConfirmationRecord, DiseaseTemplate, DiseaseTemplateInput,
    Listing, Pagination, Payload, ScanRequest, ScanResponse,
};
use crate::errors::Result;
use crate::http::HttpClient;

pub async fn dashboard_stats(http: &HttpClient) -> Result<AdminDashboardStats> {
    let stats: Payload<AdminDashboardStats> = http.get("/admin/dashboard-stats").await?;
    Ok(stats.into_inner())
}

pub async fn confirmation_history(
    http: &HttpClient,
    pagination: &Pagination,
) -> Result<Listing<ConfirmationRecord>> {
    let listing: Payload<Listing<ConfirmationRecord>> = http
        .get_with_query("/admin/confirmation-history", pagination)
        .await?;
    Ok(listing.into_inner())
}

pub async fn create_disease_template(
    http: &HttpClient,
    template: &DiseaseTemplateInput,
) -> Result<ApiAck> {
    http.post("/admin/disease-template", template).await
}

pub async fn disease_templates(http: &HttpClient) -> Result<Vec<DiseaseTemplate>> {
    let listing: Payload<Listing<DiseaseTemplate>> = http.get("/admin/disease-templates").await?;
    Ok(listing.into_inner().into_items())
}

pub async fn update_disease_template(
    http: &HttpClient,
    template_id: &str,
    template: &DiseaseTemplateInput,
) -> Result<ApiAck> {
    http.put(&format!("/admin/disease-template/{}", template_id), template)
        .await
}

pub async fn search_appointments(
    http: &HttpClient,
    search: &AppointmentSearch,
) -> Result<Listing<Appointment>> {
    let listing: Payload<Listing<Appointment>> = http
        .get_with_query("/admin/appointments/search", search)
        .await?;
    Ok(listing.into_inner())
}

pub async fn all_appointments(
    http: &HttpClient,
    query: &AllAppointmentsQuery,
) -> Result<Listing<Appointment>> {
    let listing: Payload<Listing<Appointment>> = http
        .get_with_query("/admin/all-appointments", query)
        .await?;
    Ok(listing.into_inner())
}

pub async fn delete_appointment(http: &HttpClient, appointment_id: &str) -> Result<ApiAck> {
    http.delete(&format!("/admin/appointment/{}", appointment_id))
        .await
}

/// Looks up an appointment from a scanned QR payload or a typed numeric code.
pub async fn scan_appointment(
    http: &HttpClient,
    code: &str,
    method: CheckInMethod,
) -> Result<ScanResponse> {
    let request = ScanRequest {
        code: code.to_string(),
        method,
    };
    let (status, mut response): (u16, ScanResponse) =
        http.post_with_status("/admin/scan-appointment", &request).await?;
    response.status = status;
    Ok(response)
}

pub async fn confirm_appointment(
    http: &HttpClient,
    appointment_id: &str,
    method: CheckInMethod,
    notes: Option<&str>,
) -> Result<ApiAck> {
    let request = ConfirmRequest {
        method,
        notes: notes.map(str::to_string),
    };
    let path = format!("/admin/confirm-appointment/{}", appointment_id);
    let (status, mut ack): (u16, ApiAck) = http.post_with_status(&path, &request).await?;
    ack.status = status;
    Ok(ack)
}
