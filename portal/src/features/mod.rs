//! Feature units: the page-level operations built on the typed hooks.

pub mod analytics;
pub mod booking;
pub mod check_in;
pub mod documents;
pub mod patient_search;
