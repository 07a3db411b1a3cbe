use super::super::checklist::{Checklist, CompletionMetrics};
use super::super::domain::ApplicationStatus;

/// Reasons the applicant cannot submit yet, phrased for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionBlocked {
    #[error("application is already {status}; only drafts can be submitted")]
    NotDraft { status: ApplicationStatus },
    #[error("no required documents are configured for this scholarship")]
    NoRequiredDocuments,
    #[error("upload the remaining required documents before submitting: {}", .outstanding.join(", "))]
    MissingDocuments { outstanding: Vec<String> },
}

/// Guard for the applicant-driven `draft -> submitted` transition.
pub struct SubmissionGate;

impl SubmissionGate {
    pub fn allows(status: ApplicationStatus, metrics: &CompletionMetrics) -> bool {
        status == ApplicationStatus::Draft && metrics.is_complete()
    }

    pub fn check(status: ApplicationStatus, checklist: &Checklist) -> Result<(), SubmissionBlocked> {
        if status != ApplicationStatus::Draft {
            return Err(SubmissionBlocked::NotDraft { status });
        }

        if checklist.metrics.required == 0 {
            return Err(SubmissionBlocked::NoRequiredDocuments);
        }

        let outstanding: Vec<String> = checklist
            .outstanding()
            .map(|item| item.name.clone())
            .collect();
        if !outstanding.is_empty() {
            return Err(SubmissionBlocked::MissingDocuments { outstanding });
        }

        Ok(())
    }
}
