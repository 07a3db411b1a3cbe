//! Scholarship application intake, document checklist, and approval pipeline.
//!
//! Applicants build a draft, upload the documents the catalog asks for, and submit once
//! every required document is in. Staff then verify documents and move the application
//! through review, approval, processing, and release.

pub mod checklist;
pub mod domain;
pub mod intake;
pub mod lifecycle;
pub mod normalization;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use checklist::{Checklist, ChecklistItem, CompletionMetrics};
pub use domain::{
    AcademicInformation, ApplicantProfile, ApplicationDraft, ApplicationId, ApplicationStatus,
    CategoryId, DocumentCategory, DocumentId, DocumentTypeId, FileReference,
    FinancialInformation, RequiredDocumentType, StudentId, SubcategoryId, SubmittedDocument,
    UnknownStatus, VerificationStatus,
};
pub use intake::{IntakeGuard, IntakePolicy, IntakeViolation};
pub use lifecycle::{
    ApplicationProgress, StatusChange, StatusTransition, SubmissionBlocked, SubmissionGate,
    TransitionError,
};
pub use repository::{
    ApplicationRecord, ApplicationRepository, ApplicationStatusView, DocumentRepository,
    NoticeError, NoticePublisher, RepositoryError, StatusNotice,
};
pub use router::application_router;
pub use service::{
    ApplicationChecklist, ApplicationServiceError, DocumentUpload, ScholarshipApplicationService,
    UploadRejected, VerificationDecision,
};
