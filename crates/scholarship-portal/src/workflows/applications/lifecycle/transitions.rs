use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::ApplicationStatus;
use super::super::repository::ApplicationRecord;
use super::stage::held_stage;

/// Staff request to move an application along the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    /// Only read when approving; defaults to the requested amount.
    #[serde(default)]
    pub approved_amount: Option<u32>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move application from {from} to {to}")]
    NotAllowed {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("drafts are submitted by the applicant once every required document is uploaded")]
    SubmitThroughGate,
    #[error("an application paused at {held} cannot resume at the earlier {to}")]
    ResumeBehind {
        held: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("approved amount {approved} must be between 1 and the requested {requested}")]
    InvalidApprovedAmount { approved: u32, requested: u32 },
}

/// A validated staff transition ready to be applied to its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub approved_amount: Option<u32>,
    pub remarks: Option<String>,
    pub at: DateTime<Utc>,
}

impl StatusTransition {
    pub fn plan(
        record: &ApplicationRecord,
        change: StatusChange,
        at: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        let from = record.status;
        let to = change.status;

        if from == ApplicationStatus::Draft && to == ApplicationStatus::Submitted {
            return Err(TransitionError::SubmitThroughGate);
        }

        if !from.can_transition_to(to) {
            return Err(TransitionError::NotAllowed { from, to });
        }

        if from == ApplicationStatus::OnHold {
            if let Some(target) = to.pipeline_index() {
                let floor = held_stage(record);
                if target < floor {
                    let held = ApplicationStatus::pipeline()
                        .get(floor)
                        .copied()
                        .unwrap_or(from);
                    return Err(TransitionError::ResumeBehind { held, to });
                }
            }
        }

        let approved_amount = if to == ApplicationStatus::Approved {
            let approved = change.approved_amount.unwrap_or(record.requested_amount);
            if approved == 0 || approved > record.requested_amount {
                return Err(TransitionError::InvalidApprovedAmount {
                    approved,
                    requested: record.requested_amount,
                });
            }
            Some(approved)
        } else {
            None
        };

        Ok(Self {
            from,
            to,
            approved_amount,
            remarks: change
                .remarks
                .map(|remarks| remarks.trim().to_string())
                .filter(|remarks| !remarks.is_empty()),
            at,
        })
    }

    pub fn apply(self, record: &mut ApplicationRecord) {
        if self.to == ApplicationStatus::OnHold {
            record.held_from = Some(self.from);
        } else if self.to.pipeline_index().is_some() {
            record.held_from = None;
        }
        record.status = self.to;
        record.updated_at = self.at;

        if let Some(index) = self.to.pipeline_index() {
            let reached = |status: ApplicationStatus| {
                status
                    .pipeline_index()
                    .map(|stage| index >= stage)
                    .unwrap_or(false)
            };
            if reached(ApplicationStatus::Reviewed) && record.reviewed_at.is_none() {
                record.reviewed_at = Some(self.at);
            }
            if reached(ApplicationStatus::Approved) && record.approved_at.is_none() {
                record.approved_at = Some(self.at);
            }
        }

        if let Some(amount) = self.approved_amount {
            record.approved_amount = Some(amount);
        }
        if self.remarks.is_some() {
            record.remarks = self.remarks;
        }
    }
}
