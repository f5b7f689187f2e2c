//! Document storage endpoints.

use adapters::FormPart;

use super::models::{Document, DocumentListItem, UploadResponse};
use crate::errors::Result;
use crate::http::HttpClient;

/// Multipart upload: the file goes in the `document` part, the optional
/// description in a `description` text part.
pub async fn upload_document(
    http: &HttpClient,
    file_name: &str,
    mime_type: &str,
    bytes: Vec<u8>,
    description: Option<&str>,
) -> Result<Document> {
    let mut parts = vec![FormPart::file(
        "document",
        file_name,
        Some(mime_type.to_string()),
        bytes,
    )];
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        parts.push(FormPart::text("description", description));
    }
    let response: UploadResponse = http.upload("/upload-document", parts).await?;
    Ok(response.document)
}

/// The list must be a bare array of `{_id, filename, uploadedAt}`; anything
/// else is rejected.
pub async fn my_documents(http: &HttpClient) -> Result<Vec<DocumentListItem>> {
    http.get("/my-documents").await
}

pub async fn download_document(http: &HttpClient, id: &str) -> Result<Vec<u8>> {
    http.download(&format!("/documents/{}/download", id)).await
}

pub async fn delete_document(http: &HttpClient, id: &str) -> Result<()> {
    let _: serde_json::Value = http.delete(&format!("/documents/{}", id)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adapters::{HttpResponse, Method, PartValue, RequestBody, ScriptedTransport};
    use serde_json::json;

    use super::*;
    use crate::errors::PortalError;
    use crate::navigation::Navigator;
    use crate::session::SessionStore;

    fn client(transport: Arc<ScriptedTransport>) -> HttpClient {
        HttpClient::new(
            transport,
            "http://api.test",
            SessionStore::in_memory(),
            Navigator::new(),
        )
    }

    #[tokio::test]
    async fn upload_sends_document_and_description_parts() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            201,
            json!({ "document": {
                "_id": "d1",
                "filename": "scan.pdf",
                "uploadedAt": "2024-03-01T10:00:00Z"
            }}),
        );
        let http = client(transport.clone());

        let doc = upload_document(
            &http,
            "scan.pdf",
            "application/pdf",
            b"%PDF".to_vec(),
            Some("x-ray"),
        )
        .await
        .unwrap();
        assert_eq!(doc.id, "d1");

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "http://api.test/upload-document");
        assert_eq!(sent.header("content-type"), None);
        let RequestBody::Multipart(parts) = sent.body else {
            panic!("expected multipart body");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "document");
        assert!(matches!(parts[0].value, PartValue::File { ref file_name, .. } if file_name == "scan.pdf"));
        assert_eq!(parts[1].name, "description");
    }

    #[tokio::test]
    async fn empty_description_is_not_sent() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!({ "document": { "_id": "d2", "filename": "a.pdf", "uploadedAt": "x" } }),
        );
        let http = client(transport.clone());

        upload_document(&http, "a.pdf", "application/pdf", Vec::new(), Some(""))
            .await
            .unwrap();
        let RequestBody::Multipart(parts) = transport.last_request().unwrap().body else {
            panic!("expected multipart body");
        };
        assert_eq!(parts.len(), 1);
    }

    #[tokio::test]
    async fn listing_rejects_items_without_id() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!([{ "filename": "a.pdf", "uploadedAt": "x" }]));
        let http = client(transport);

        let err = my_documents(&http).await.unwrap_err();
        assert!(matches!(err, PortalError::Decode { .. }));
    }

    #[tokio::test]
    async fn download_and_delete_hit_document_paths() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push(HttpResponse::new(200, b"%PDF-1.4".to_vec()))
            .push_json(200, json!({ "message": "Document deleted" }));
        let http = client(transport.clone());

        let bytes = download_document(&http, "d1").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
        delete_document(&http, "d1").await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://api.test/documents/d1/download");
        assert_eq!(sent[1].method, Method::Delete);
        assert_eq!(sent[1].url, "http://api.test/documents/d1");
    }
}
