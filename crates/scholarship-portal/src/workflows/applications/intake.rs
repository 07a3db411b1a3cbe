use super::domain::{ApplicantProfile, ApplicationDraft, ApplicationStatus};
use super::normalization::{grade_from_percentage, income_from_range, parse_percentage};

const DEFAULT_MAX_REQUESTED_AMOUNT: u32 = 100_000;
const MAX_YEAR_LEVEL: u8 = 6;

/// Field-level problems shown inline on the application form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("requested amount must be between 1 and {max} (found {found})")]
    RequestedAmountOutOfRange { max: u32, found: u32 },
    #[error("year level must be between 1 and 6 (found {0})")]
    InvalidYearLevel(u8),
    #[error("household size must be at least 1")]
    EmptyHousehold,
    #[error("general average '{0}' must be a percentage between 0 and 100")]
    InvalidGeneralAverage(String),
    #[error("application is {0} and can no longer be edited")]
    Locked(ApplicationStatus),
    #[error("an application cannot be moved to another student")]
    StudentChanged,
}

/// Limits applied to applicant drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakePolicy {
    max_requested_amount: u32,
}

impl IntakePolicy {
    pub fn new(max_requested_amount: u32) -> Self {
        let sanitized = if max_requested_amount > 0 {
            max_requested_amount
        } else {
            DEFAULT_MAX_REQUESTED_AMOUNT
        };

        Self {
            max_requested_amount: sanitized,
        }
    }

    pub fn max_requested_amount(&self) -> u32 {
        self.max_requested_amount
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTED_AMOUNT)
    }
}

/// Guard responsible for producing `ApplicantProfile` instances.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    policy: IntakePolicy,
}

impl IntakeGuard {
    pub fn with_policy(policy: IntakePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Validate a draft and derive the normalized income and grade figures.
    pub fn profile_from_draft(
        &self,
        draft: &ApplicationDraft,
    ) -> Result<ApplicantProfile, IntakeViolation> {
        require("student_id", &draft.student_id.0)?;
        require("category_id", &draft.category_id.0)?;
        require("academic.school_name", &draft.academic.school_name)?;
        require("academic.program", &draft.academic.program)?;
        require(
            "financial.household_income_range",
            &draft.financial.household_income_range,
        )?;
        require("academic.general_average", &draft.academic.general_average)?;

        let max = self.policy.max_requested_amount;
        if draft.requested_amount == 0 || draft.requested_amount > max {
            return Err(IntakeViolation::RequestedAmountOutOfRange {
                max,
                found: draft.requested_amount,
            });
        }

        let year_level = draft.academic.year_level;
        if year_level == 0 || year_level > MAX_YEAR_LEVEL {
            return Err(IntakeViolation::InvalidYearLevel(year_level));
        }

        if draft.financial.household_size == 0 {
            return Err(IntakeViolation::EmptyHousehold);
        }

        let average = parse_percentage(&draft.academic.general_average).ok_or_else(|| {
            IntakeViolation::InvalidGeneralAverage(draft.academic.general_average.clone())
        })?;

        let mut financial = draft.financial.clone();
        financial.household_income_range = financial.household_income_range.trim().to_string();
        financial.father_occupation = trimmed(financial.father_occupation);
        financial.mother_occupation = trimmed(financial.mother_occupation);

        let mut academic = draft.academic.clone();
        academic.school_name = academic.school_name.trim().to_string();
        academic.program = academic.program.trim().to_string();

        Ok(ApplicantProfile {
            estimated_monthly_income: income_from_range(&financial.household_income_range),
            grade_point: grade_from_percentage(average),
            financial,
            academic,
        })
    }
}

fn require(field: &'static str, value: &str) -> Result<(), IntakeViolation> {
    if value.trim().is_empty() {
        Err(IntakeViolation::MissingField(field))
    } else {
        Ok(())
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
