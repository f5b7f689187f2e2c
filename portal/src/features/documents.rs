//! Medical document upload, listing, download and categorization.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::api::models::{Document, DocumentListItem};
use crate::errors::{PortalError, Result};
use crate::services::PortalQueries;

pub const NO_FILE_SELECTED: &str = "Please select a file to upload";
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentCategory {
    Prescription,
    XRay,
    Imaging,
    Other,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 4] = [
        DocumentCategory::Prescription,
        DocumentCategory::XRay,
        DocumentCategory::Imaging,
        DocumentCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DocumentCategory::Prescription => "Prescriptions",
            DocumentCategory::XRay => "X-Rays",
            DocumentCategory::Imaging => "Imaging",
            DocumentCategory::Other => "Other",
        }
    }

    /// Best-effort guess for display grouping. A description naming a
    /// category wins; otherwise the filename is scanned for keywords.
    pub fn categorize(filename: &str, description: Option<&str>) -> Self {
        description
            .and_then(Self::from_description)
            .or_else(|| Self::from_filename(filename))
            .unwrap_or(DocumentCategory::Other)
    }

    fn from_description(description: &str) -> Option<Self> {
        match description.trim().to_ascii_lowercase().as_str() {
            "prescription" | "prescriptions" => Some(DocumentCategory::Prescription),
            "x-ray" | "xray" | "x-rays" | "xrays" => Some(DocumentCategory::XRay),
            "imaging" => Some(DocumentCategory::Imaging),
            "other" => Some(DocumentCategory::Other),
            _ => None,
        }
    }

    fn from_filename(filename: &str) -> Option<Self> {
        let name = filename.to_ascii_lowercase();
        let words: Vec<&str> = name
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has_word = |word: &str| words.iter().any(|w| *w == word);

        if name.contains("prescription") || has_word("rx") {
            Some(DocumentCategory::Prescription)
        } else if name.contains("xray") || name.contains("x-ray") {
            Some(DocumentCategory::XRay)
        } else if name.contains("imaging")
            || name.contains("scan")
            || has_word("mri")
            || has_word("ct")
        {
            Some(DocumentCategory::Imaging)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Documents grouped for the records view; `all` keeps the backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedDocuments {
    pub all: Vec<DocumentListItem>,
    pub prescriptions: Vec<DocumentListItem>,
    pub xrays: Vec<DocumentListItem>,
    pub imaging: Vec<DocumentListItem>,
    pub other: Vec<DocumentListItem>,
}

impl CategorizedDocuments {
    pub fn new(documents: Vec<DocumentListItem>) -> Self {
        let mut grouped = CategorizedDocuments::default();
        for doc in &documents {
            let bucket = match DocumentCategory::categorize(&doc.filename, None) {
                DocumentCategory::Prescription => &mut grouped.prescriptions,
                DocumentCategory::XRay => &mut grouped.xrays,
                DocumentCategory::Imaging => &mut grouped.imaging,
                DocumentCategory::Other => &mut grouped.other,
            };
            bucket.push(doc.clone());
        }
        grouped.all = documents;
        grouped
    }

    pub fn get(&self, category: DocumentCategory) -> &[DocumentListItem] {
        match category {
            DocumentCategory::Prescription => &self.prescriptions,
            DocumentCategory::XRay => &self.xrays,
            DocumentCategory::Imaging => &self.imaging,
            DocumentCategory::Other => &self.other,
        }
    }
}

pub fn mime_type_for(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Reads `path` and uploads it. `None` means no file was chosen.
pub async fn upload(
    queries: &PortalQueries,
    path: Option<&Path>,
    description: Option<&str>,
) -> Result<Document> {
    let path = path.ok_or_else(|| PortalError::Validation(NO_FILE_SELECTED.to_string()))?;

    let accepted = extension(path)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    if !accepted {
        return Err(PortalError::Validation(format!(
            "Unsupported file type; accepted: {}",
            ACCEPTED_EXTENSIONS.join(", ")
        )));
    }

    let metadata = tokio::fs::metadata(path).await.map_err(|err| {
        PortalError::Validation(format!("Cannot read {}: {}", path.display(), err))
    })?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(PortalError::Validation(
            "File is larger than the 10MB upload limit".to_string(),
        ));
    }

    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("document"));

    let document = queries
        .upload_document(&file_name, mime_type_for(path), bytes, description)
        .await?;
    info!("Uploaded {} as {}", file_name, document.id);
    Ok(document)
}

pub async fn list(queries: &PortalQueries) -> Result<CategorizedDocuments> {
    Ok(CategorizedDocuments::new(queries.my_documents().await?))
}

/// Downloads a document into `target`. A directory target keeps the
/// document's own filename.
pub async fn download(
    queries: &PortalQueries,
    id: &str,
    filename: &str,
    target: &Path,
) -> Result<PathBuf> {
    let bytes = queries.download_document(id).await?;
    let destination = if target.is_dir() {
        target.join(filename)
    } else {
        target.to_path_buf()
    };
    tokio::fs::write(&destination, &bytes).await?;
    info!("Downloaded {} ({} bytes) to {}", id, bytes.len(), destination.display());
    Ok(destination)
}

pub async fn delete(queries: &PortalQueries, id: &str) -> Result<()> {
    queries.delete_document(id).await?;
    info!("Deleted document {}", id);
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adapters::{HttpResponse, RequestBody, ScriptedTransport};
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

    fn item(id: &str, filename: &str) -> DocumentListItem {
        DocumentListItem {
            id: id.to_string(),
            filename: filename.to_string(),
            uploaded_at: "2024-03-01T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn filename_keywords_pick_a_category() {
        use DocumentCategory::*;
        assert_eq!(DocumentCategory::categorize("Prescription_march.pdf", None), Prescription);
        assert_eq!(DocumentCategory::categorize("rx-2024.pdf", None), Prescription);
        assert_eq!(DocumentCategory::categorize("chest_xray.png", None), XRay);
        assert_eq!(DocumentCategory::categorize("Knee X-Ray.jpg", None), XRay);
        assert_eq!(DocumentCategory::categorize("brain_mri.pdf", None), Imaging);
        assert_eq!(DocumentCategory::categorize("ct_abdomen.pdf", None), Imaging);
        assert_eq!(DocumentCategory::categorize("doctor_notes.pdf", None), Other);
    }

    #[test]
    fn description_wins_over_filename() {
        assert_eq!(
            DocumentCategory::categorize("scan_001.pdf", Some("prescription")),
            DocumentCategory::Prescription
        );
        assert_eq!(
            DocumentCategory::categorize("scan_001.pdf", Some("from my GP")),
            DocumentCategory::Imaging
        );
    }

    #[test]
    fn every_document_lands_in_one_bucket() {
        let grouped = CategorizedDocuments::new(vec![
            item("1", "rx.pdf"),
            item("2", "xray.png"),
            item("3", "mri.pdf"),
            item("4", "invoice.pdf"),
        ]);
        assert_eq!(grouped.all.len(), 4);
        let total: usize = DocumentCategory::ALL
            .iter()
            .map(|c| grouped.get(*c).len())
            .sum();
        assert_eq!(total, 4);
        assert_eq!(grouped.other[0].id, "4");
    }

    #[tokio::test]
    async fn upload_without_file_is_rejected_locally() {
        let transport = Arc::new(ScriptedTransport::new());
        let queries = queries(transport.clone());

        let err = upload(&queries, None, Some("x-ray")).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(ref m) if m == NO_FILE_SELECTED));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let queries = queries(Arc::new(ScriptedTransport::new()));

        assert!(matches!(
            upload(&queries, Some(&path), None).await,
            Err(PortalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn upload_reads_the_file_and_sends_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chest_xray.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            201,
            json!({ "document": { "_id": "d9", "filename": "chest_xray.png", "uploadedAt": "2024-03-01T10:00:00Z" } }),
        );
        let queries = queries(transport.clone());

        let document = upload(&queries, Some(&path), Some("x-ray")).await.unwrap();
        assert_eq!(document.id, "d9");

        let RequestBody::Multipart(parts) = transport.last_request().unwrap().body else {
            panic!("expected multipart body");
        };
        assert!(matches!(
            &parts[0].value,
            adapters::PartValue::File { mime_type, bytes, .. }
                if mime_type.as_deref() == Some("image/png") && bytes.as_slice() == b"\x89PNG"
        ));
    }

    #[tokio::test]
    async fn download_into_directory_uses_document_name() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(HttpResponse::new(200, b"%PDF-1.4".to_vec()));
        let queries = queries(transport);

        let written = download(&queries, "d1", "report.pdf", dir.path()).await.unwrap();
        assert_eq!(written, dir.path().join("report.pdf"));
        assert_eq!(std::fs::read(written).unwrap(), b"%PDF-1.4");
    }
}
