use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::checklist::{Checklist, ChecklistItem, CompletionMetrics};
use super::domain::{
    ApplicationDraft, ApplicationId, ApplicationStatus, DocumentId, DocumentTypeId, FileReference,
    RequiredDocumentType, StudentId, SubmittedDocument, VerificationStatus,
};
use super::intake::{IntakeGuard, IntakePolicy, IntakeViolation};
use super::lifecycle::{
    ApplicationProgress, StatusChange, StatusTransition, SubmissionBlocked, SubmissionGate,
    TransitionError,
};
use super::repository::{
    ApplicationRecord, ApplicationRepository, DocumentRepository, NoticePublisher,
    RepositoryError, StatusNotice,
};
use crate::config::PortalConfig;

/// Service composing intake validation, the document checklist, and the status pipeline.
pub struct ScholarshipApplicationService<R, D, N> {
    guard: Arc<IntakeGuard>,
    applications: Arc<R>,
    documents: Arc<D>,
    notices: Arc<N>,
    max_upload_bytes: u64,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_document_id() -> DocumentId {
    DocumentId(DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Upload metadata; the bytes themselves live with the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub student_id: StudentId,
    pub document_type_id: DocumentTypeId,
    pub file: FileReference,
}

/// Staff verdict on one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDecision {
    pub status: VerificationStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Everything the checklist screen needs in one payload.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationChecklist {
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub items: Vec<ChecklistItem>,
    pub metrics: CompletionMetrics,
    pub can_submit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    pub progress: ApplicationProgress,
}

impl<R, D, N> ScholarshipApplicationService<R, D, N>
where
    R: ApplicationRepository + 'static,
    D: DocumentRepository + 'static,
    N: NoticePublisher + 'static,
{
    pub fn new(
        applications: Arc<R>,
        documents: Arc<D>,
        notices: Arc<N>,
        config: &PortalConfig,
    ) -> Self {
        let guard = IntakeGuard::with_policy(IntakePolicy::new(config.max_requested_amount));

        Self {
            guard: Arc::new(guard),
            applications,
            documents,
            notices,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Validate a draft and store it with a fresh identifier.
    pub fn create_draft(
        &self,
        draft: ApplicationDraft,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let profile = self.guard.profile_from_draft(&draft)?;
        let now = Utc::now();

        let record = ApplicationRecord {
            application_id: next_application_id(),
            student_id: draft.student_id,
            category_id: draft.category_id,
            subcategory_id: draft.subcategory_id,
            profile,
            status: ApplicationStatus::Draft,
            requested_amount: draft.requested_amount,
            approved_amount: None,
            remarks: None,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            reviewed_at: None,
            approved_at: None,
            held_from: None,
        };

        let stored = self.applications.insert(record)?;
        info!(application_id = %stored.application_id.0, "draft application created");
        Ok(stored)
    }

    /// Replace the applicant-provided fields of a draft.
    pub fn update_draft(
        &self,
        application_id: &ApplicationId,
        draft: ApplicationDraft,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.fetch_existing(application_id)?;

        if record.status != ApplicationStatus::Draft {
            return Err(IntakeViolation::Locked(record.status).into());
        }
        if record.student_id != draft.student_id {
            return Err(IntakeViolation::StudentChanged.into());
        }

        record.profile = self.guard.profile_from_draft(&draft)?;
        record.category_id = draft.category_id;
        record.subcategory_id = draft.subcategory_id;
        record.requested_amount = draft.requested_amount;
        record.updated_at = Utc::now();

        self.applications.update(record.clone())?;
        Ok(record)
    }

    /// Applications owned by one student, oldest first.
    pub fn list_applications(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, ApplicationServiceError> {
        let mut records = self.applications.list_for_student(student_id)?;
        records.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.application_id.cmp(&right.application_id))
        });
        Ok(records)
    }

    /// Fetch an application and current status for API responses.
    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.fetch_existing(application_id)
    }

    pub fn required_types(&self) -> Result<Vec<RequiredDocumentType>, ApplicationServiceError> {
        let mut types = self.documents.required_types()?;
        types.sort_by_key(|document_type| (!document_type.required, document_type.priority));
        Ok(types)
    }

    pub fn documents(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<SubmittedDocument>, ApplicationServiceError> {
        self.fetch_existing(application_id)?;
        Ok(self.documents.documents_for(application_id)?)
    }

    /// Attach a file to the application, replacing any earlier upload of the same type.
    pub fn upload_document(
        &self,
        application_id: &ApplicationId,
        upload: DocumentUpload,
    ) -> Result<SubmittedDocument, ApplicationServiceError> {
        let mut record = self.fetch_existing(application_id)?;

        if record.student_id != upload.student_id {
            return Err(UploadRejected::NotOwner.into());
        }
        if !matches!(
            record.status,
            ApplicationStatus::Draft | ApplicationStatus::OnHold
        ) {
            return Err(UploadRejected::Locked(record.status).into());
        }
        self.check_file(&upload.file)?;

        let catalogued = self
            .documents
            .required_types()?
            .iter()
            .any(|document_type| document_type.id == upload.document_type_id);
        if !catalogued {
            return Err(UploadRejected::UnknownDocumentType(upload.document_type_id).into());
        }

        let now = Utc::now();
        let previous = self
            .documents
            .documents_for(application_id)?
            .into_iter()
            .filter(|document| document.document_type_id == upload.document_type_id)
            .max_by_key(|document| document.submitted_at);

        let stored = match previous {
            Some(mut document) => {
                document.file = upload.file;
                document.status = VerificationStatus::Pending;
                document.submitted_at = now;
                document.verified_at = None;
                document.remarks = None;
                self.documents.update_document(document.clone())?;
                info!(
                    application_id = %application_id.0,
                    document_type_id = upload.document_type_id.0,
                    "document replaced"
                );
                document
            }
            None => {
                let document = SubmittedDocument {
                    id: next_document_id(),
                    application_id: application_id.clone(),
                    document_type_id: upload.document_type_id,
                    status: VerificationStatus::Pending,
                    submitted_at: now,
                    verified_at: None,
                    file: upload.file,
                    remarks: None,
                };
                let document = self.documents.insert_document(document)?;
                info!(
                    application_id = %application_id.0,
                    document_type_id = upload.document_type_id.0,
                    "document uploaded"
                );
                document
            }
        };

        record.updated_at = now;
        self.applications.update(record)?;
        Ok(stored)
    }

    /// Record a staff verdict on an uploaded document.
    pub fn verify_document(
        &self,
        document_id: DocumentId,
        decision: VerificationDecision,
    ) -> Result<SubmittedDocument, ApplicationServiceError> {
        if decision.status == VerificationStatus::Missing {
            return Err(UploadRejected::InvalidVerification.into());
        }

        let mut document = self
            .documents
            .fetch_document(document_id)?
            .ok_or(RepositoryError::NotFound)?;
        if document.status == VerificationStatus::Missing {
            return Err(UploadRejected::NotUploaded(document_id).into());
        }

        document.status = decision.status;
        document.verified_at = match decision.status {
            VerificationStatus::Verified | VerificationStatus::Rejected => Some(Utc::now()),
            VerificationStatus::Pending | VerificationStatus::Missing => None,
        };
        document.remarks = decision
            .remarks
            .map(|remarks| remarks.trim().to_string())
            .filter(|remarks| !remarks.is_empty());
        self.documents.update_document(document.clone())?;

        info!(
            application_id = %document.application_id.0,
            document_id = document.id.0,
            status = document.status.label(),
            "document verification recorded"
        );

        if document.status == VerificationStatus::Rejected {
            let record = self.fetch_existing(&document.application_id)?;
            let mut details = BTreeMap::new();
            details.insert(
                "document_type_id".to_string(),
                document.document_type_id.0.to_string(),
            );
            if let Some(remarks) = &document.remarks {
                details.insert("remarks".to_string(), remarks.clone());
            }
            self.notify(StatusNotice {
                template: "document_rejected".to_string(),
                application_id: record.application_id,
                student_id: record.student_id,
                details,
            });
        }

        Ok(document)
    }

    /// Build the checklist, completion metrics, and submit eligibility for display.
    pub fn checklist(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationChecklist, ApplicationServiceError> {
        let record = self.fetch_existing(application_id)?;
        let checklist = self.build_checklist(application_id)?;
        let gate = SubmissionGate::check(record.status, &checklist);

        Ok(ApplicationChecklist {
            application_id: record.application_id.clone(),
            status: record.status,
            can_submit: gate.is_ok(),
            blocked_reason: gate.err().map(|blocked| blocked.to_string()),
            progress: ApplicationProgress::for_record(&record),
            metrics: checklist.metrics,
            items: checklist.items,
        })
    }

    /// Applicant submission: `draft -> submitted` once the checklist is complete.
    pub fn submit(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.fetch_existing(application_id)?;
        let checklist = self.build_checklist(application_id)?;

        if let Err(blocked) = SubmissionGate::check(record.status, &checklist) {
            warn!(application_id = %application_id.0, reason = %blocked, "submission blocked");
            return Err(blocked.into());
        }

        let now = Utc::now();
        record.status = ApplicationStatus::Submitted;
        record.submitted_at = Some(now);
        record.updated_at = now;
        self.applications.update(record.clone())?;

        info!(application_id = %application_id.0, "application submitted");

        let mut details = BTreeMap::new();
        details.insert(
            "documents".to_string(),
            checklist.metrics.submitted_required.to_string(),
        );
        self.notify(StatusNotice {
            template: "application_submitted".to_string(),
            application_id: record.application_id.clone(),
            student_id: record.student_id.clone(),
            details,
        });

        Ok(record)
    }

    /// Staff-driven status change along the pipeline.
    pub fn advance(
        &self,
        application_id: &ApplicationId,
        change: StatusChange,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.fetch_existing(application_id)?;
        let transition = StatusTransition::plan(&record, change, Utc::now())?;
        let from = transition.from;
        transition.apply(&mut record);

        self.applications.update(record.clone())?;
        info!(
            application_id = %application_id.0,
            from = from.label(),
            to = record.status.label(),
            "application status changed"
        );

        let mut details = BTreeMap::new();
        details.insert("from".to_string(), from.label().to_string());
        details.insert("to".to_string(), record.status.label().to_string());
        if let Some(amount) = record.approved_amount {
            details.insert("approved_amount".to_string(), amount.to_string());
        }
        self.notify(StatusNotice {
            template: format!("application_{}", record.status.label()),
            application_id: record.application_id.clone(),
            student_id: record.student_id.clone(),
            details,
        });

        Ok(record)
    }

    /// Notices follow a committed write, so a failed publish is logged rather than returned.
    fn notify(&self, notice: StatusNotice) {
        let template = notice.template.clone();
        let application_id = notice.application_id.0.clone();
        if let Err(err) = self.notices.publish(notice) {
            warn!(%application_id, %template, error = %err, "notice not delivered");
        }
    }

    fn fetch_existing(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let record = self
            .applications
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn build_checklist(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Checklist, ApplicationServiceError> {
        let types = self.documents.required_types()?;
        let submitted = self.documents.documents_for(application_id)?;
        Ok(Checklist::build(&types, &submitted))
    }

    fn check_file(&self, file: &FileReference) -> Result<(), UploadRejected> {
        if file.storage_key.trim().is_empty() || file.file_name.trim().is_empty() {
            return Err(UploadRejected::MissingFile);
        }
        if file.size_bytes == 0 {
            return Err(UploadRejected::EmptyFile);
        }
        if file.size_bytes > self.max_upload_bytes {
            return Err(UploadRejected::TooLarge {
                max: self.max_upload_bytes,
                found: file.size_bytes,
            });
        }
        Ok(())
    }
}

/// Document upload and verification problems reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejected {
    #[error("application belongs to another student")]
    NotOwner,
    #[error("documents cannot be changed while the application is {0}")]
    Locked(ApplicationStatus),
    #[error("document type {0} is not in the catalog")]
    UnknownDocumentType(DocumentTypeId),
    #[error("file reference needs a storage key and a file name")]
    MissingFile,
    #[error("uploaded file is empty")]
    EmptyFile,
    #[error("file exceeds the {max} byte upload limit (found {found})")]
    TooLarge { max: u64, found: u64 },
    #[error("verification must be pending, verified, or rejected")]
    InvalidVerification,
    #[error("document {0} has no uploaded file to verify")]
    NotUploaded(DocumentId),
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Submission(#[from] SubmissionBlocked),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Upload(#[from] UploadRejected),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
