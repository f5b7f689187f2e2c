//! QR / numeric-code appointment check-in for front-desk staff.
//!
//! A check-in is two calls: scan looks the appointment up, confirm marks the
//! patient as arrived using the same method the code was entered with.

use tracing::info;

use crate::api::models::{ApiAck, Appointment, CheckInMethod};
use crate::errors::{PortalError, Result};
use crate::services::PortalQueries;

/// A code as read from the camera or typed by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCode {
    pub code: String,
    pub method: CheckInMethod,
}

impl ScannedCode {
    /// Digits only is a typed appointment number; anything else is a QR payload.
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(PortalError::Validation(
                "Please scan a QR code or enter an appointment code".to_string(),
            ));
        }
        let method = if code.chars().all(|c| c.is_ascii_digit()) {
            CheckInMethod::NumericCode
        } else {
            CheckInMethod::QrScan
        };
        Ok(Self {
            code: code.to_string(),
            method,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckIn {
    pub code: ScannedCode,
    pub appointment: Appointment,
}

pub async fn scan(queries: &PortalQueries, raw: &str) -> Result<CheckIn> {
    let code = ScannedCode::parse(raw)?;
    let response = queries.scan_appointment(&code.code, code.method).await?;

    match (response.success, response.appointment) {
        (Some(false), _) | (_, None) => Err(PortalError::Api {
            status: response.status,
            message: response
                .message
                .unwrap_or_else(|| "No appointment found for this code".to_string()),
        }),
        (_, Some(appointment)) => {
            info!("Scanned appointment {} via {}", appointment.id, code.method);
            Ok(CheckIn { code, appointment })
        }
    }
}

pub async fn confirm(
    queries: &PortalQueries,
    check_in: &CheckIn,
    notes: Option<&str>,
) -> Result<ApiAck> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    let ack = queries
        .confirm_appointment(&check_in.appointment.id, check_in.code.method, notes)
        .await?;
    if ack.success == Some(false) {
        return Err(PortalError::Api {
            status: ack.status,
            message: ack
                .message
                .unwrap_or_else(|| "Appointment could not be confirmed".to_string()),
        });
    }
    info!("Checked in appointment {}", check_in.appointment.id);
    Ok(ack)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adapters::{RequestBody, ScriptedTransport};
    use serde_json::json;

    use super::*;
    use crate::http::HttpClient;
    use crate::navigation::Navigator;
    use crate::services::QueryClient;
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

    fn body(transport: &ScriptedTransport, index: usize) -> serde_json::Value {
        match &transport.requests()[index].body {
            RequestBody::Json(value) => value.clone(),
            other => panic!("expected json body, got {:?}", other),
        }
    }

    #[test]
    fn digits_are_numeric_codes() {
        assert_eq!(
            ScannedCode::parse(" 482913 ").unwrap(),
            ScannedCode {
                code: "482913".into(),
                method: CheckInMethod::NumericCode
            }
        );
        assert_eq!(
            ScannedCode::parse("APT-482913").unwrap().method,
            CheckInMethod::QrScan
        );
        assert!(ScannedCode::parse("   ").is_err());
    }

    #[tokio::test]
    async fn scan_then_confirm_reuses_the_method() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_json(
                200,
                json!({ "success": true, "appointment": { "_id": "a1", "patientName": "Asha" } }),
            )
            .push_json(200, json!({ "success": true, "message": "Confirmed" }));
        let queries = queries(transport.clone());

        let check_in = scan(&queries, "123456").await.unwrap();
        assert_eq!(check_in.appointment.patient_name.as_deref(), Some("Asha"));
        confirm(&queries, &check_in, Some("  arrived early ")).await.unwrap();

        assert_eq!(
            body(&transport, 0),
            json!({ "code": "123456", "method": "NUMERIC_CODE" })
        );
        assert_eq!(
            transport.requests()[1].url,
            "http://api.test/admin/confirm-appointment/a1"
        );
        assert_eq!(
            body(&transport, 1),
            json!({ "method": "NUMERIC_CODE", "notes": "arrived early" })
        );
    }

    #[tokio::test]
    async fn unknown_code_reports_backend_message() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({ "success": false, "message": "Invalid code" }));
        let queries = queries(transport);

        let err = scan(&queries, "qr:payload").await.unwrap_err();
        assert!(matches!(
            err,
            PortalError::Api { status: 200, ref message } if message == "Invalid code"
        ));
    }

    #[tokio::test]
    async fn rejected_confirmation_keeps_status() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_json(
                200,
                json!({ "success": true, "appointment": { "_id": "a1", "patientName": "Asha" } }),
            )
            .push_json(202, json!({ "success": false, "message": "Already checked in" }));
        let queries = queries(transport);

        let found = scan(&queries, "1234").await.unwrap();
        let err = confirm(&queries, &found, None).await.unwrap_err();
        assert_eq!(err.status(), Some(202));
        assert_eq!(err.user_message(), "Already checked in");
    }
}
