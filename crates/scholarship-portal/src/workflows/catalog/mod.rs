//! Catalog of document types applicants are asked to upload.

mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::workflows::applications::domain::{
    DocumentCategory, DocumentTypeId, RequiredDocumentType,
};

/// Ordered set of document types with unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCatalog {
    types: Vec<RequiredDocumentType>,
}

impl DocumentCatalog {
    /// Default set used when no catalog file is configured.
    pub fn standard() -> Self {
        let entry = |id: u32, name: &str, category, required, priority| RequiredDocumentType {
            id: DocumentTypeId(id),
            name: name.to_string(),
            category,
            required,
            priority,
        };

        Self {
            types: vec![
                entry(
                    1,
                    "Certificate of Enrollment",
                    DocumentCategory::Academic,
                    true,
                    10,
                ),
                entry(
                    2,
                    "Report Card or Transcript of Records",
                    DocumentCategory::Academic,
                    true,
                    20,
                ),
                entry(
                    3,
                    "Income Tax Return or Certificate of Tax Exemption",
                    DocumentCategory::Financial,
                    true,
                    30,
                ),
                entry(
                    4,
                    "Certificate of Indigency",
                    DocumentCategory::Financial,
                    true,
                    40,
                ),
                entry(
                    5,
                    "PSA Birth Certificate",
                    DocumentCategory::Identification,
                    true,
                    50,
                ),
                entry(6, "School ID", DocumentCategory::Identification, true, 60),
                entry(
                    7,
                    "Barangay Certificate of Residency",
                    DocumentCategory::Residency,
                    true,
                    70,
                ),
                entry(
                    8,
                    "Recommendation Letter",
                    DocumentCategory::Other,
                    false,
                    80,
                ),
                entry(9, "2x2 ID Photo", DocumentCategory::Identification, false, 90),
            ],
        }
    }

    pub fn from_types(types: Vec<RequiredDocumentType>) -> Result<Self, CatalogImportError> {
        let mut seen = HashSet::new();
        for document_type in &types {
            if !seen.insert(document_type.id) {
                return Err(CatalogImportError::DuplicateId(document_type.id));
            }
        }
        Ok(Self { types })
    }

    pub fn types(&self) -> &[RequiredDocumentType] {
        &self.types
    }

    pub fn into_types(self) -> Vec<RequiredDocumentType> {
        self.types
    }

    pub fn get(&self, id: DocumentTypeId) -> Option<&RequiredDocumentType> {
        self.types.iter().find(|document_type| document_type.id == id)
    }

    pub fn required(&self) -> impl Iterator<Item = &RequiredDocumentType> {
        self.types.iter().filter(|document_type| document_type.required)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    DuplicateId(DocumentTypeId),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read document catalog: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid document catalog CSV: {}", err),
            CatalogImportError::DuplicateId(id) => {
                write!(f, "document type id {} appears more than once", id)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::DuplicateId(_) => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads a catalog from a `Name,Category,Required,Priority[,ID]` CSV export.
///
/// Rows without an `ID` take their 1-based position among the kept rows, moved up past any id
/// another row already claims. Rows without a `Priority` sort by position.
pub struct DocumentCatalogImporter;

impl DocumentCatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DocumentCatalog, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<DocumentCatalog, CatalogImportError> {
        let entries = parser::parse_entries(reader)?;
        let mut taken: HashSet<u32> = entries.iter().filter_map(|entry| entry.id).collect();

        let types = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let position = index as u32 + 1;
                let id = entry.id.unwrap_or_else(|| {
                    let mut candidate = position;
                    while !taken.insert(candidate) {
                        candidate += 1;
                    }
                    candidate
                });
                RequiredDocumentType {
                    id: DocumentTypeId(id),
                    name: entry.name,
                    category: entry.category,
                    required: entry.required,
                    priority: entry
                        .priority
                        .unwrap_or_else(|| u16::try_from(position).unwrap_or(u16::MAX)),
                }
            })
            .collect();

        DocumentCatalog::from_types(types)
    }
}
