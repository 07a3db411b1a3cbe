//! Reconciles the catalogued document types with what an applicant has uploaded.

mod metrics;

pub use metrics::CompletionMetrics;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::domain::{
    DocumentCategory, DocumentTypeId, RequiredDocumentType, SubmittedDocument, VerificationStatus,
};

/// One row of the applicant's document checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub document_type_id: DocumentTypeId,
    pub name: String,
    pub category: DocumentCategory,
    pub required: bool,
    pub priority: Option<u16>,
    pub status: VerificationStatus,
    /// False for uploads whose type is no longer catalogued.
    pub listed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<SubmittedDocument>,
}

impl ChecklistItem {
    pub fn is_submitted(&self) -> bool {
        self.status.counts_as_submitted()
    }
}

/// Ordered checklist plus the counts derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checklist {
    pub items: Vec<ChecklistItem>,
    pub metrics: CompletionMetrics,
}

impl Checklist {
    pub fn build(types: &[RequiredDocumentType], submitted: &[SubmittedDocument]) -> Self {
        let items = build_items(types, submitted);
        let metrics = CompletionMetrics::from_items(&items);
        Self { items, metrics }
    }

    /// Required items still lacking an accepted upload, in checklist order.
    pub fn outstanding(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.items
            .iter()
            .filter(|item| item.required && !item.is_submitted())
    }
}

/// Pick the current upload per document type.
///
/// The latest `submitted_at` wins; on a tie the document appearing later in `submitted` wins,
/// which matches repository insertion order for re-uploads.
fn current_documents(
    submitted: &[SubmittedDocument],
) -> (
    HashMap<DocumentTypeId, &SubmittedDocument>,
    Vec<DocumentTypeId>,
) {
    let mut current: HashMap<DocumentTypeId, &SubmittedDocument> = HashMap::new();
    let mut first_seen = Vec::new();

    for document in submitted {
        let replace = match current.get(&document.document_type_id) {
            Some(existing) => existing.submitted_at <= document.submitted_at,
            None => {
                first_seen.push(document.document_type_id);
                true
            }
        };
        if replace {
            current.insert(document.document_type_id, document);
        }
    }

    (current, first_seen)
}

fn build_items(
    types: &[RequiredDocumentType],
    submitted: &[SubmittedDocument],
) -> Vec<ChecklistItem> {
    let (current, first_seen) = current_documents(submitted);

    let mut listed: Vec<ChecklistItem> = types
        .iter()
        .map(|document_type| {
            let document = current.get(&document_type.id).map(|doc| (*doc).clone());
            ChecklistItem {
                document_type_id: document_type.id,
                name: document_type.name.clone(),
                category: document_type.category,
                required: document_type.required,
                priority: Some(document_type.priority),
                status: document
                    .as_ref()
                    .map(|doc| doc.status)
                    .unwrap_or(VerificationStatus::Missing),
                listed: true,
                document,
            }
        })
        .collect();

    // Stable sort keeps catalog order for equal priorities.
    listed.sort_by_key(|item| (!item.required, item.priority.unwrap_or(u16::MAX)));

    let catalogued: HashSet<DocumentTypeId> = types.iter().map(|item| item.id).collect();
    let unlisted = first_seen
        .into_iter()
        .filter(|type_id| !catalogued.contains(type_id))
        .filter_map(|type_id| current.get(&type_id))
        .map(|document| ChecklistItem {
            document_type_id: document.document_type_id,
            name: document.file.file_name.clone(),
            category: DocumentCategory::Other,
            required: false,
            priority: None,
            status: document.status,
            listed: false,
            document: Some((*document).clone()),
        });

    listed.extend(unlisted);
    listed
}
