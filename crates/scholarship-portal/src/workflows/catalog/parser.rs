use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::workflows::applications::domain::DocumentCategory;

#[derive(Debug)]
pub(crate) struct CatalogEntry {
    pub(crate) id: Option<u32>,
    pub(crate) name: String,
    pub(crate) category: DocumentCategory,
    pub(crate) required: bool,
    pub(crate) priority: Option<u16>,
}

/// Rows with a blank name are dropped; everything else is kept in file order.
pub(crate) fn parse_entries<R: Read>(reader: R) -> Result<Vec<CatalogEntry>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for record in csv_reader.deserialize::<CatalogRow>() {
        let row = record?;
        let Some(name) = row.name else {
            continue;
        };

        entries.push(CatalogEntry {
            id: row.id,
            category: row
                .category
                .as_deref()
                .map(DocumentCategory::from_tag)
                .unwrap_or(DocumentCategory::Other),
            required: row.required.as_deref().map(parse_flag).unwrap_or(false),
            priority: row.priority,
            name,
        });
    }

    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "ID", default)]
    id: Option<u32>,
    #[serde(rename = "Name", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "Category", default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    #[serde(rename = "Required", default, deserialize_with = "empty_string_as_none")]
    required: Option<String>,
    #[serde(rename = "Priority", default)]
    priority: Option<u16>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Unrecognized answers count as "not required".
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "1"
    )
}
