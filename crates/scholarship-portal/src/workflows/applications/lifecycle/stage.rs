use serde::Serialize;

use super::super::domain::ApplicationStatus;
use super::super::repository::ApplicationRecord;

pub const STAGE_COUNT: usize = ApplicationStatus::pipeline().len();

const STAGE_LABELS: [&str; STAGE_COUNT] = [
    "Draft",
    "Submitted",
    "Under Review",
    "Approved",
    "Processing",
    "Released",
];

pub fn stage_index(status: ApplicationStatus) -> Option<usize> {
    status.pipeline_index()
}

/// Stage for a status as stored or sent over the wire; unknown strings have none.
pub fn stage_for_label(raw: &str) -> Option<usize> {
    raw.parse::<ApplicationStatus>().ok().and_then(stage_index)
}

pub fn stage_label(index: usize) -> &'static str {
    STAGE_LABELS
        .get(index)
        .copied()
        .unwrap_or(STAGE_LABELS[STAGE_COUNT - 1])
}

/// Progress tracker view for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationProgress {
    pub stage_index: usize,
    pub stage_label: &'static str,
    pub total_stages: usize,
    pub percent: u8,
    /// Set when the application left the pipeline (rejected, on hold, cancelled).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<ApplicationStatus>,
}

impl ApplicationProgress {
    pub fn for_record(record: &ApplicationRecord) -> Self {
        match stage_index(record.status) {
            Some(index) => Self::at(index, None),
            None => Self::at(held_stage(record), Some(record.status)),
        }
    }

    fn at(index: usize, halted: Option<ApplicationStatus>) -> Self {
        let index = index.min(STAGE_COUNT - 1);
        let percent = (index * 100 / (STAGE_COUNT - 1)) as u8;
        Self {
            stage_index: index,
            stage_label: stage_label(index),
            total_stages: STAGE_COUNT,
            percent,
            halted,
        }
    }
}

/// Stage an off-pipeline application had reached: the status it was paused from, else the
/// furthest stage its timestamps prove.
pub(super) fn held_stage(record: &ApplicationRecord) -> usize {
    record
        .held_from
        .and_then(stage_index)
        .unwrap_or_else(|| furthest_evidenced_stage(record))
}

fn furthest_evidenced_stage(record: &ApplicationRecord) -> usize {
    let evidence = [
        (record.approved_at, ApplicationStatus::Approved),
        (record.reviewed_at, ApplicationStatus::Reviewed),
        (record.submitted_at, ApplicationStatus::Submitted),
    ];

    evidence
        .into_iter()
        .find(|(stamp, _)| stamp.is_some())
        .and_then(|(_, status)| stage_index(status))
        .unwrap_or(0)
}
