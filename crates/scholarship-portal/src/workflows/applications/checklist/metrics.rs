use serde::{Deserialize, Serialize};

use super::ChecklistItem;
use crate::workflows::applications::domain::VerificationStatus;

/// Counts over the required checklist items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMetrics {
    pub required: usize,
    pub submitted_required: usize,
    pub verified_required: usize,
    /// 0..=100; 100 only once every required item is submitted.
    pub percentage: u8,
}

impl CompletionMetrics {
    pub fn from_items(items: &[ChecklistItem]) -> Self {
        let required = items.iter().filter(|item| item.required).count();
        let submitted_required = items
            .iter()
            .filter(|item| item.required && item.is_submitted())
            .count();
        let verified_required = items
            .iter()
            .filter(|item| item.required && item.status == VerificationStatus::Verified)
            .count();

        Self::new(required, submitted_required, verified_required)
    }

    pub fn new(required: usize, submitted_required: usize, verified_required: usize) -> Self {
        let submitted_required = submitted_required.min(required);
        let verified_required = verified_required.min(submitted_required);

        Self {
            required,
            submitted_required,
            verified_required,
            percentage: completion_percentage(submitted_required, required),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.required > 0 && self.submitted_required == self.required
    }

    pub fn outstanding(&self) -> usize {
        self.required - self.submitted_required
    }
}

fn completion_percentage(submitted: usize, required: usize) -> u8 {
    if required == 0 {
        return 0;
    }

    let rounded = ((submitted as f64 / required as f64) * 100.0).round() as u8;
    if submitted < required {
        // 199 of 200 would otherwise round up to a misleading 100.
        rounded.min(99)
    } else {
        rounded.min(100)
    }
}
