//! Typed queries and mutations over the API layer.
//!
//! Each query pairs a fixed `QueryKey` with one API call and goes through the
//! shared `QueryClient`. Mutations call the API directly and invalidate the
//! keys whose data they change.

use std::collections::BTreeMap;

use tracing::debug;

use super::query_cache::{QueryClient, QueryKey};
use crate::api::models::{
    AdminDashboardStats, AllAppointmentsQuery, ApiAck, Appointment, AppointmentSearch,
    BookAppointmentPayload, BookingResponse, CatalogEntry, CheckInMethod, ConfirmationRecord,
    DiseaseTemplate, DiseaseTemplateInput, Doctor, DoctorDashboard, Document, DocumentListItem,
    Hospital, HospitalFilter, Listing, Pagination, ScanResponse,
};
use crate::api::{admin, appointments, catalog, doctor, documents};
use crate::errors::Result;
use crate::http::HttpClient;

pub mod keys {
    use super::QueryKey;

    pub fn documents_list() -> QueryKey {
        QueryKey::from(["documents", "list"])
    }

    pub fn doctors() -> QueryKey {
        QueryKey::from(["doctors"])
    }

    pub fn doctor(id: &str) -> QueryKey {
        QueryKey::from(["doctor", id])
    }

    pub fn hospitals() -> QueryKey {
        QueryKey::from(["hospitals"])
    }

    pub fn hospital(id: &str) -> QueryKey {
        QueryKey::from(["hospital", id])
    }

    pub fn hospital_groups() -> QueryKey {
        QueryKey::from(["hospitalGroups"])
    }

    pub fn cities() -> QueryKey {
        QueryKey::from(["cities"])
    }

    pub fn specializations() -> QueryKey {
        QueryKey::from(["specializations"])
    }

    pub fn doctor_dashboard() -> QueryKey {
        QueryKey::from(["doctorDashboard"])
    }

    pub fn doctor_schedule() -> QueryKey {
        QueryKey::from(["doctorSchedule"])
    }

    pub fn doctor_pending() -> QueryKey {
        QueryKey::from(["doctorPending"])
    }

    pub fn admin_dashboard() -> QueryKey {
        QueryKey::from(["adminDashboard"])
    }

    pub fn confirmation_history() -> QueryKey {
        QueryKey::from(["confirmationHistory"])
    }

    pub fn disease_templates() -> QueryKey {
        QueryKey::from(["diseaseTemplates"])
    }

    pub fn admin_search() -> QueryKey {
        QueryKey::from(["adminAppointmentsSearch"])
    }

    pub fn admin_all_appointments() -> QueryKey {
        QueryKey::from(["adminAllAppointments"])
    }
}

#[derive(Clone)]
pub struct PortalQueries {
    http: HttpClient,
    cache: QueryClient,
}

impl PortalQueries {
    pub fn new(http: HttpClient, cache: QueryClient) -> Self {
        Self { http, cache }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn cache(&self) -> &QueryClient {
        &self.cache
    }

    // ---------------- documents ----------------

    pub async fn my_documents(&self) -> Result<Vec<DocumentListItem>> {
        self.cache
            .fetch(keys::documents_list(), || documents::my_documents(&self.http))
            .await
    }

    pub async fn upload_document(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        description: Option<&str>,
    ) -> Result<Document> {
        let document =
            documents::upload_document(&self.http, file_name, mime_type, bytes, description)
                .await?;
        self.cache.invalidate(&keys::documents_list());
        Ok(document)
    }

    pub async fn delete_document(&self, id: &str) -> Result<()> {
        documents::delete_document(&self.http, id).await?;
        self.cache.invalidate(&keys::documents_list());
        Ok(())
    }

    /// Not cached; every call downloads the file again.
    pub async fn download_document(&self, id: &str) -> Result<Vec<u8>> {
        documents::download_document(&self.http, id).await
    }

    // ---------------- catalog ----------------

    pub async fn doctors(&self, filters: &BTreeMap<String, String>) -> Result<Vec<Doctor>> {
        let key = keys::doctors().with_params(filters);
        self.cache
            .fetch(key, || catalog::doctors(&self.http, filters))
            .await
    }

    pub async fn doctor(&self, id: &str) -> Result<Doctor> {
        self.cache
            .fetch(keys::doctor(id), || catalog::doctor(&self.http, id))
            .await
    }

    pub async fn hospitals(&self, filter: &HospitalFilter) -> Result<Vec<Hospital>> {
        let key = keys::hospitals().with_params(filter);
        self.cache
            .fetch(key, || catalog::hospitals(&self.http, filter))
            .await
    }

    pub async fn hospital(&self, id: &str) -> Result<Hospital> {
        self.cache
            .fetch(keys::hospital(id), || catalog::hospital(&self.http, id))
            .await
    }

    pub async fn hospital_groups(&self) -> Result<Vec<CatalogEntry>> {
        self.cache
            .fetch(keys::hospital_groups(), || catalog::hospital_groups(&self.http))
            .await
    }

    pub async fn cities(&self) -> Result<Vec<CatalogEntry>> {
        self.cache
            .fetch(keys::cities(), || catalog::cities(&self.http))
            .await
    }

    pub async fn specializations(&self) -> Result<Vec<CatalogEntry>> {
        self.cache
            .fetch(keys::specializations(), || catalog::specializations(&self.http))
            .await
    }

    // ---------------- appointments ----------------

    pub async fn book_appointment(
        &self,
        payload: &BookAppointmentPayload,
    ) -> Result<BookingResponse> {
        let response = appointments::book(&self.http, payload).await?;
        self.cache.invalidate(&keys::doctor_pending());
        Ok(response)
    }

    // ---------------- doctor ----------------

    pub async fn doctor_dashboard(&self) -> Result<DoctorDashboard> {
        self.cache
            .fetch(keys::doctor_dashboard(), || doctor::dashboard(&self.http))
            .await
    }

    pub async fn todays_schedule(&self) -> Result<Vec<Appointment>> {
        self.cache
            .fetch(keys::doctor_schedule(), || doctor::todays_schedule(&self.http))
            .await
    }

    pub async fn pending_appointments(
        &self,
        pagination: &Pagination,
    ) -> Result<Listing<Appointment>> {
        let key = keys::doctor_pending().with_params(pagination);
        self.cache
            .fetch(key, || doctor::pending_appointments(&self.http, pagination))
            .await
    }

    pub async fn complete_appointment(&self, appointment_id: &str) -> Result<ApiAck> {
        let ack = doctor::complete_appointment(&self.http, appointment_id).await?;
        for key in [
            keys::doctor_pending(),
            keys::doctor_schedule(),
            keys::doctor_dashboard(),
        ] {
            self.cache.invalidate(&key);
        }
        Ok(ack)
    }

    // ---------------- admin ----------------

    pub async fn admin_dashboard(&self) -> Result<AdminDashboardStats> {
        self.cache
            .fetch(keys::admin_dashboard(), || admin::dashboard_stats(&self.http))
            .await
    }

    pub async fn confirmation_history(
        &self,
        pagination: &Pagination,
    ) -> Result<Listing<ConfirmationRecord>> {
        let key = keys::confirmation_history().with_params(pagination);
        self.cache
            .fetch(key, || admin::confirmation_history(&self.http, pagination))
            .await
    }

    pub async fn disease_templates(&self) -> Result<Vec<DiseaseTemplate>> {
        self.cache
            .fetch(keys::disease_templates(), || admin::disease_templates(&self.http))
            .await
    }

    pub async fn create_disease_template(&self, template: &DiseaseTemplateInput) -> Result<ApiAck> {
        let ack = admin::create_disease_template(&self.http, template).await?;
        self.cache.invalidate(&keys::disease_templates());
        Ok(ack)
    }

    pub async fn update_disease_template(
        &self,
        template_id: &str,
        template: &DiseaseTemplateInput,
    ) -> Result<ApiAck> {
        let ack = admin::update_disease_template(&self.http, template_id, template).await?;
        self.cache.invalidate(&keys::disease_templates());
        Ok(ack)
    }

    pub async fn search_appointments(
        &self,
        search: &AppointmentSearch,
    ) -> Result<Listing<Appointment>> {
        let key = keys::admin_search().with_params(search);
        self.cache
            .fetch(key, || admin::search_appointments(&self.http, search))
            .await
    }

    pub async fn all_appointments(
        &self,
        query: &AllAppointmentsQuery,
    ) -> Result<Listing<Appointment>> {
        let key = keys::admin_all_appointments().with_params(query);
        self.cache
            .fetch(key, || admin::all_appointments(&self.http, query))
            .await
    }

    pub async fn delete_appointment(&self, appointment_id: &str) -> Result<ApiAck> {
        let ack = admin::delete_appointment(&self.http, appointment_id).await?;
        self.invalidate_admin_appointments();
        Ok(ack)
    }

    pub async fn scan_appointment(&self, code: &str, method: CheckInMethod) -> Result<ScanResponse> {
        admin::scan_appointment(&self.http, code, method).await
    }

    pub async fn confirm_appointment(
        &self,
        appointment_id: &str,
        method: CheckInMethod,
        notes: Option<&str>,
    ) -> Result<ApiAck> {
        let ack = admin::confirm_appointment(&self.http, appointment_id, method, notes).await?;
        self.invalidate_admin_appointments();
        self.cache.invalidate(&keys::confirmation_history());
        Ok(ack)
    }

    fn invalidate_admin_appointments(&self) {
        debug!("Admin appointment data changed");
        for key in [
            keys::admin_search(),
            keys::admin_all_appointments(),
            keys::admin_dashboard(),
        ] {
            self.cache.invalidate(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use adapters::{HttpResponse, ScriptedTransport};
    use serde_json::json;

    use super::*;
    use crate::navigation::Navigator;
    use crate::session::SessionStore;

    fn queries(transport: Arc<ScriptedTransport>) -> PortalQueries {
        let http = HttpClient::new(
            transport,
            "http://api.test",
            SessionStore::in_memory(),
            Navigator::new(),
        );
        PortalQueries::new(http, QueryClient::new())
    }

    fn listing() -> serde_json::Value {
        json!([{ "_id": "d1", "filename": "a.pdf", "uploadedAt": "2024-03-01T10:00:00Z" }])
    }

    #[tokio::test]
    async fn concurrent_document_lists_send_one_request() {
        let transport =
            Arc::new(ScriptedTransport::new().with_latency(Duration::from_millis(20)));
        transport.push_json(200, listing());
        let queries = queries(transport.clone());

        let (a, b) = tokio::join!(queries.my_documents(), queries.my_documents());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn delete_invalidates_the_document_list() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_json(200, listing())
            .push(HttpResponse::new(204, Vec::new()))
            .push_json(200, json!([]));
        let queries = queries(transport.clone());

        assert_eq!(queries.my_documents().await.unwrap().len(), 1);
        assert_eq!(queries.my_documents().await.unwrap().len(), 1);
        assert_eq!(transport.requests().len(), 1);

        queries.delete_document("d1").await.unwrap();
        assert!(!queries.cache().is_cached(&keys::documents_list()));
        assert!(queries.my_documents().await.unwrap().is_empty());
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn upload_invalidates_the_document_list() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, listing()).push_json(
            201,
            json!({ "document": { "_id": "d2", "filename": "b.pdf", "uploadedAt": "2024-03-02T10:00:00Z" } }),
        );
        let queries = queries(transport);

        queries.my_documents().await.unwrap();
        queries
            .upload_document("b.pdf", "application/pdf", vec![1, 2], None)
            .await
            .unwrap();
        assert!(!queries.cache().is_cached(&keys::documents_list()));
    }

    #[tokio::test]
    async fn failed_mutation_keeps_the_cache() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_json(200, listing())
            .push_json(404, json!({ "message": "Document not found" }));
        let queries = queries(transport);

        queries.my_documents().await.unwrap();
        assert!(queries.delete_document("missing").await.is_err());
        assert!(queries.cache().is_cached(&keys::documents_list()));
    }

    #[tokio::test]
    async fn filtered_queries_are_cached_per_filter() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_json(200, json!([{ "_id": "h1", "name": "City Care" }]))
            .push_json(200, json!({ "data": [] }));
        let queries = queries(transport.clone());

        let pune = HospitalFilter {
            city_id: Some("pune".into()),
            hospital_group_id: None,
        };
        let delhi = HospitalFilter {
            city_id: Some("delhi".into()),
            hospital_group_id: None,
        };
        assert_eq!(queries.hospitals(&pune).await.unwrap().len(), 1);
        assert!(queries.hospitals(&delhi).await.unwrap().is_empty());
        assert_eq!(queries.hospitals(&pune).await.unwrap().len(), 1);
        assert_eq!(transport.requests().len(), 2);
    }
}
