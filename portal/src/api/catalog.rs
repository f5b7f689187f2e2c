//! Public directory data: doctors, hospitals, cities and specializations.

use std::collections::BTreeMap;

use super::models::{CatalogEntry, Doctor, Hospital, HospitalFilter, Listing, Payload};
use crate::errors::Result;
use crate::http::HttpClient;

/// `filters` is passed through as query parameters (`specialization`, `cityId`, ...).
pub async fn doctors(http: &HttpClient, filters: &BTreeMap<String, String>) -> Result<Vec<Doctor>> {
    let listing: Payload<Listing<Doctor>> = http.get_with_query("/user/doctors", filters).await?;
    Ok(listing.into_inner().into_items())
}

pub async fn doctor(http: &HttpClient, id: &str) -> Result<Doctor> {
    let doctor: Payload<Doctor> = http.get(&format!("/user/doctors/{}", id)).await?;
    Ok(doctor.into_inner())
}

pub async fn hospitals(http: &HttpClient, filter: &HospitalFilter) -> Result<Vec<Hospital>> {
    let listing: Payload<Listing<Hospital>> = http.get_with_query("/user/hospitals", filter).await?;
    Ok(listing.into_inner().into_items())
}

pub async fn hospital(http: &HttpClient, id: &str) -> Result<Hospital> {
    let hospital: Payload<Hospital> = http.get(&format!("/user/hospitals/{}", id)).await?;
    Ok(hospital.into_inner())
}

pub async fn hospital_groups(http: &HttpClient) -> Result<Vec<CatalogEntry>> {
    entries(http, "/user/hospital-groups").await
}

pub async fn cities(http: &HttpClient) -> Result<Vec<CatalogEntry>> {
    entries(http, "/user/cities").await
}

pub async fn specializations(http: &HttpClient) -> Result<Vec<CatalogEntry>> {
    entries(http, "/user/specializations").await
}

async fn entries(http: &HttpClient, path: &str) -> Result<Vec<CatalogEntry>> {
    let listing: Payload<Listing<CatalogEntry>> = http.get(path).await?;
    Ok(listing.into_inner().into_items())
}
