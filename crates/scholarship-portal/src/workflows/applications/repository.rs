use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicantProfile, ApplicationId, ApplicationStatus, CategoryId, DocumentId,
    RequiredDocumentType, StudentId, SubcategoryId, SubmittedDocument,
};
use super::lifecycle::ApplicationProgress;

/// Repository record containing the applicant data, status, and pipeline timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application_id: ApplicationId,
    pub student_id: StudentId,
    pub category_id: CategoryId,
    pub subcategory_id: Option<SubcategoryId>,
    pub profile: ApplicantProfile,
    pub status: ApplicationStatus,
    pub requested_amount: u32,
    pub approved_amount: Option<u32>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Pipeline status the application was paused from while `on_hold`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held_from: Option<ApplicationStatus>,
}

impl ApplicationRecord {
    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.application_id.clone(),
            student_id: self.student_id.clone(),
            status: self.status.label(),
            progress: ApplicationProgress::for_record(self),
            requested_amount: self.requested_amount,
            approved_amount: self.approved_amount,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            approved_at: self.approved_at,
            remarks: self.remarks.clone(),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Document catalog and upload storage boundary.
pub trait DocumentRepository: Send + Sync {
    fn required_types(&self) -> Result<Vec<RequiredDocumentType>, RepositoryError>;
    /// Documents attached to an application in upload order.
    fn documents_for(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<SubmittedDocument>, RepositoryError>;
    fn fetch_document(&self, id: DocumentId) -> Result<Option<SubmittedDocument>, RepositoryError>;
    fn insert_document(
        &self,
        document: SubmittedDocument,
    ) -> Result<SubmittedDocument, RepositoryError>;
    fn update_document(&self, document: SubmittedDocument) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for applicant notices (e-mail or SMS adapters).
pub trait NoticePublisher: Send + Sync {
    fn publish(&self, notice: StatusNotice) -> Result<(), NoticeError>;
}

/// Notice payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotice {
    pub template: String,
    pub application_id: ApplicationId,
    pub student_id: StudentId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an application's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub student_id: StudentId,
    pub status: &'static str,
    pub progress: ApplicationProgress,
    pub requested_amount: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}
