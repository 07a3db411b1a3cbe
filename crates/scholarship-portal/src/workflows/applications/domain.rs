use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for scholarship applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Reference to the applicant supplied by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubcategoryId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentTypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status tracked throughout the scholarship pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    Reviewed,
    Approved,
    Processing,
    Released,
    Rejected,
    OnHold,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn all() -> [Self; 9] {
        [
            Self::Draft,
            Self::Submitted,
            Self::Reviewed,
            Self::Approved,
            Self::Processing,
            Self::Released,
            Self::Rejected,
            Self::OnHold,
            Self::Cancelled,
        ]
    }

    /// Linear stages shown on the applicant's progress tracker.
    pub const fn pipeline() -> [Self; 6] {
        [
            Self::Draft,
            Self::Submitted,
            Self::Reviewed,
            Self::Approved,
            Self::Processing,
            Self::Released,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Reviewed => "reviewed",
            Self::Approved => "approved",
            Self::Processing => "processing",
            Self::Released => "released",
            Self::Rejected => "rejected",
            Self::OnHold => "on_hold",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn pipeline_index(self) -> Option<usize> {
        match self {
            Self::Draft => Some(0),
            Self::Submitted => Some(1),
            Self::Reviewed => Some(2),
            Self::Approved => Some(3),
            Self::Processing => Some(4),
            Self::Released => Some(5),
            Self::Rejected | Self::OnHold | Self::Cancelled => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Released | Self::Rejected | Self::Cancelled)
    }

    /// Whether staff may move an application from `self` to `next`.
    ///
    /// Pipeline moves are strictly forward and a draft can only become `submitted`. Rejection
    /// and cancellation are reachable from every non-terminal state. `on_hold` pauses an
    /// application between submission and release; this check only knows the status, so the
    /// no-earlier-than-paused rule for resuming lives in `StatusTransition::plan`.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next || self.is_terminal() {
            return false;
        }

        match next {
            Self::Rejected | Self::Cancelled => true,
            Self::OnHold => matches!(
                self,
                Self::Submitted | Self::Reviewed | Self::Approved | Self::Processing
            ),
            Self::Draft => false,
            _ => match (self, self.pipeline_index(), next.pipeline_index()) {
                (Self::Draft, _, _) => next == Self::Submitted,
                (Self::OnHold, _, _) => next != Self::Released,
                (_, Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a status string does not name a known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::all()
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

/// Verification state of one submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Missing,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    /// Rejected uploads must be replaced before they count toward completion.
    pub const fn counts_as_submitted(self) -> bool {
        matches!(self, Self::Pending | Self::Verified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Academic,
    Financial,
    Identification,
    Residency,
    Other,
}

impl DocumentCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Financial => "financial",
            Self::Identification => "identification",
            Self::Residency => "residency",
            Self::Other => "other",
        }
    }

    /// Lenient parse used by catalog imports; unknown tags fall back to `Other`.
    pub fn from_tag(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "academic" | "academics" | "school" => Self::Academic,
            "financial" | "finance" | "income" => Self::Financial,
            "identification" | "identity" | "id" => Self::Identification,
            "residency" | "residence" | "address" => Self::Residency,
            _ => Self::Other,
        }
    }
}

/// Document the portal asks applicants for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDocumentType {
    pub id: DocumentTypeId,
    pub name: String,
    pub category: DocumentCategory,
    pub required: bool,
    /// Display order within the checklist, lower first.
    pub priority: u16,
}

/// Pointer to an uploaded file held by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub storage_key: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedDocument {
    pub id: DocumentId,
    pub application_id: ApplicationId,
    pub document_type_id: DocumentTypeId,
    pub status: VerificationStatus,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub file: FileReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Applicant input for creating or editing a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub student_id: StudentId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub subcategory_id: Option<SubcategoryId>,
    pub requested_amount: u32,
    pub financial: FinancialInformation,
    pub academic: AcademicInformation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialInformation {
    /// Range string as picked in the form, e.g. `"10,001 - 20,000"`.
    pub household_income_range: String,
    pub household_size: u8,
    #[serde(default)]
    pub father_occupation: Option<String>,
    #[serde(default)]
    pub mother_occupation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicInformation {
    pub school_name: String,
    pub program: String,
    pub year_level: u8,
    /// Latest general average as entered, e.g. `"91.5"` or `"91.5%"`.
    pub general_average: String,
}

/// Validated draft data carrying the normalized figures used by reviewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub financial: FinancialInformation,
    pub academic: AcademicInformation,
    pub estimated_monthly_income: u32,
    pub grade_point: f32,
}
