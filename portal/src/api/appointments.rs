//! Patient-side appointment booking.

use super::models::{BookAppointmentPayload, BookingResponse};
use crate::errors::Result;
use crate::http::HttpClient;

/// Requires a signed-in patient; the backend reads the patient from the token.
pub async fn book(http: &HttpClient, payload: &BookAppointmentPayload) -> Result<BookingResponse> {
    let (status, mut response): (u16, BookingResponse) =
        http.post_with_status("/user/book-appointment", payload).await?;
    response.status = status;
    Ok(response)
}
