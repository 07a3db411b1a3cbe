use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::PortalConfig;
use crate::workflows::applications::domain::{
    AcademicInformation, ApplicationDraft, ApplicationId, CategoryId, DocumentCategory,
    DocumentId, DocumentTypeId, FileReference, FinancialInformation, RequiredDocumentType,
    StudentId, SubcategoryId, SubmittedDocument, VerificationStatus,
};
use crate::workflows::applications::repository::{
    ApplicationRecord, ApplicationRepository, DocumentRepository, NoticeError, NoticePublisher,
    RepositoryError, StatusNotice,
};
use crate::workflows::applications::service::{DocumentUpload, ScholarshipApplicationService};
use crate::workflows::applications::application_router;

pub(super) const ENROLLMENT: DocumentTypeId = DocumentTypeId(1);
pub(super) const INCOME_TAX_RETURN: DocumentTypeId = DocumentTypeId(2);
pub(super) const RESIDENCY: DocumentTypeId = DocumentTypeId(3);
pub(super) const RECOMMENDATION: DocumentTypeId = DocumentTypeId(4);

pub(super) fn student() -> StudentId {
    StudentId("stu-2041".to_string())
}

pub(super) fn document_type(
    id: DocumentTypeId,
    name: &str,
    category: DocumentCategory,
    required: bool,
    priority: u16,
) -> RequiredDocumentType {
    RequiredDocumentType {
        id,
        name: name.to_string(),
        category,
        required,
        priority,
    }
}

/// Three required documents and one optional letter.
pub(super) fn document_types() -> Vec<RequiredDocumentType> {
    vec![
        document_type(
            ENROLLMENT,
            "Certificate of Enrollment",
            DocumentCategory::Academic,
            true,
            1,
        ),
        document_type(
            INCOME_TAX_RETURN,
            "Income Tax Return",
            DocumentCategory::Financial,
            true,
            2,
        ),
        document_type(
            RESIDENCY,
            "Barangay Residency Certificate",
            DocumentCategory::Residency,
            true,
            3,
        ),
        document_type(
            RECOMMENDATION,
            "Recommendation Letter",
            DocumentCategory::Other,
            false,
            4,
        ),
    ]
}

pub(super) fn draft() -> ApplicationDraft {
    ApplicationDraft {
        student_id: student(),
        category_id: CategoryId("merit".to_string()),
        subcategory_id: Some(SubcategoryId("college".to_string())),
        requested_amount: 25_000,
        financial: FinancialInformation {
            household_income_range: "10,001 - 20,000".to_string(),
            household_size: 5,
            father_occupation: Some(" Fisherman ".to_string()),
            mother_occupation: None,
        },
        academic: AcademicInformation {
            school_name: " Western Visayas State University ".to_string(),
            program: "BS Civil Engineering".to_string(),
            year_level: 2,
            general_average: "91.5".to_string(),
        },
    }
}

pub(super) fn file(name: &str) -> FileReference {
    FileReference {
        storage_key: format!("uploads/{}/{name}", student().0),
        file_name: name.to_string(),
        content_type: "application/pdf".to_string(),
        size_bytes: 48_213,
    }
}

pub(super) fn upload(document_type_id: DocumentTypeId) -> DocumentUpload {
    DocumentUpload {
        student_id: student(),
        document_type_id,
        file: file(&format!("type-{}.pdf", document_type_id.0)),
    }
}

pub(super) fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn uploaded(
    id: u64,
    document_type_id: DocumentTypeId,
    status: VerificationStatus,
    submitted_at: DateTime<Utc>,
) -> SubmittedDocument {
    SubmittedDocument {
        id: DocumentId(id),
        application_id: ApplicationId("app-fixture".to_string()),
        document_type_id,
        status,
        submitted_at,
        verified_at: None,
        file: file(&format!("doc-{id}.pdf")),
        remarks: None,
    }
}

pub(super) fn portal_config() -> PortalConfig {
    PortalConfig {
        document_catalog: None,
        max_upload_bytes: 5 * 1024 * 1024,
        max_requested_amount: 50_000,
    }
}

pub(super) type TestService =
    ScholarshipApplicationService<MemoryApplications, MemoryDocuments, MemoryNotices>;

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryApplications>,
    Arc<MemoryDocuments>,
    Arc<MemoryNotices>,
) {
    let applications = Arc::new(MemoryApplications::default());
    let documents = Arc::new(MemoryDocuments::with_types(document_types()));
    let notices = Arc::new(MemoryNotices::default());
    let service = ScholarshipApplicationService::new(
        applications.clone(),
        documents.clone(),
        notices.clone(),
        &portal_config(),
    );
    (service, applications, documents, notices)
}

/// Draft with every required document uploaded.
pub(super) fn ready_draft(service: &TestService) -> ApplicationRecord {
    let record = service.create_draft(draft()).expect("draft is valid");
    for document_type_id in [ENROLLMENT, INCOME_TAX_RETURN, RESIDENCY] {
        service
            .upload_document(&record.application_id, upload(document_type_id))
            .expect("upload accepted");
    }
    record
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&record.application_id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.application_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.student_id == student_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDocuments {
    types: Vec<RequiredDocumentType>,
    pub(super) documents: Arc<Mutex<Vec<SubmittedDocument>>>,
}

impl MemoryDocuments {
    pub(super) fn with_types(types: Vec<RequiredDocumentType>) -> Self {
        Self {
            types,
            documents: Arc::default(),
        }
    }

    pub(super) fn stored(&self) -> Vec<SubmittedDocument> {
        self.documents.lock().expect("document mutex poisoned").clone()
    }
}

impl DocumentRepository for MemoryDocuments {
    fn required_types(&self) -> Result<Vec<RequiredDocumentType>, RepositoryError> {
        Ok(self.types.clone())
    }

    fn documents_for(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<SubmittedDocument>, RepositoryError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        Ok(guard
            .iter()
            .filter(|document| &document.application_id == application_id)
            .cloned()
            .collect())
    }

    fn fetch_document(&self, id: DocumentId) -> Result<Option<SubmittedDocument>, RepositoryError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        Ok(guard.iter().find(|document| document.id == id).cloned())
    }

    fn insert_document(
        &self,
        document: SubmittedDocument,
    ) -> Result<SubmittedDocument, RepositoryError> {
        let mut guard = self.documents.lock().expect("document mutex poisoned");
        if guard.iter().any(|existing| existing.id == document.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(document.clone());
        Ok(document)
    }

    fn update_document(&self, document: SubmittedDocument) -> Result<(), RepositoryError> {
        let mut guard = self.documents.lock().expect("document mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == document.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = document;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotices {
    events: Arc<Mutex<Vec<StatusNotice>>>,
}

impl MemoryNotices {
    pub(super) fn events(&self) -> Vec<StatusNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|notice| notice.template)
            .collect()
    }
}

impl NoticePublisher for MemoryNotices {
    fn publish(&self, notice: StatusNotice) -> Result<(), NoticeError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Notice transport that is always down.
pub(super) struct FailingNotices;

impl NoticePublisher for FailingNotices {
    fn publish(&self, _notice: StatusNotice) -> Result<(), NoticeError> {
        Err(NoticeError::Transport("smtp down".to_string()))
    }
}

pub(super) struct ConflictRepository;

impl ApplicationRepository for ConflictRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn list_for_student(
        &self,
        _student_id: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_for_student(
        &self,
        _student_id: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn service_with<R: ApplicationRepository + 'static>(
    applications: R,
) -> Arc<ScholarshipApplicationService<R, MemoryDocuments, MemoryNotices>> {
    Arc::new(ScholarshipApplicationService::new(
        Arc::new(applications),
        Arc::new(MemoryDocuments::with_types(document_types())),
        Arc::new(MemoryNotices::default()),
        &portal_config(),
    ))
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    application_router(Arc::new(service))
}
