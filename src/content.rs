//! The Content Store: legal clauses and price data read from a JSON document.
//!
//! Keys are dotted paths into the JSON tree (`legal_text.section6.title`).  The store performs no
//! schema validation beyond the shape of the value asked for.

use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FormError;

/// Read-only mapping from stable keys to text values.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: Value,
}

/// The membership fee table and its surrounding notes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PriceSheet {
    /// Date the prices were last revised.
    pub stand_date: String,
    /// Column headings.
    pub header: Vec<String>,
    /// Table body, one entry per membership category.
    pub rows: Vec<Vec<String>>,
    /// Free-form notes printed under the table.
    #[serde(default)]
    pub extra_info: Vec<String>,
}

impl ContentStore {
    /// Reads and parses the content file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FormError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| FormError::asset(path, err))?;
        let store = Self::from_json(&raw).map_err(|err| match err {
            FormError::ContentData { reason, .. } => FormError::asset(path, reason),
            other => other,
        })?;
        debug!("Loaded content store from {}", path.display());
        Ok(store)
    }

    /// Parses a content store from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, FormError> {
        let root = serde_json::from_str(raw).map_err(|err| FormError::content("<root>", err))?;
        Ok(Self { root })
    }

    fn lookup(&self, key: &str) -> Result<&Value, FormError> {
        let pointer = format!("/{}", key.replace('.', "/"));
        self.root
            .pointer(&pointer)
            .ok_or_else(|| FormError::content(key, "key is missing from the content store"))
    }

    /// Returns the string stored under `key`.
    pub fn text(&self, key: &str) -> Result<&str, FormError> {
        self.lookup(key)?
            .as_str()
            .ok_or_else(|| FormError::content(key, "expected a string value"))
    }

    /// Returns the price sheet stored under `key`.
    pub fn price_sheet(&self, key: &str) -> Result<PriceSheet, FormError> {
        let sheet: PriceSheet = serde_json::from_value(self.lookup(key)?.clone())
            .map_err(|err| FormError::content(key, err))?;
        if let Some((index, row)) = sheet
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != sheet.header.len())
        {
            return Err(FormError::content(
                key,
                format!(
                    "row {} has {} cells but the header has {}",
                    index,
                    row.len(),
                    sheet.header.len()
                ),
            ));
        }
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ContentStore {
        ContentStore::from_json(
            r#"{
                "legal_text": { "section6": { "title": "§ 6 Beiträge" } },
                "prices": {
                    "stand_date": "01.01.2024",
                    "header": ["Kategorie", "Monat"],
                    "rows": [["Erwachsene", "12,00 €"]],
                    "extra_info": ["a", "b"]
                },
                "numbers": [1, 2]
            }"#,
        )
        .expect("valid json")
    }

    #[test]
    fn resolves_dotted_keys() {
        let store = store();
        assert_eq!(store.text("legal_text.section6.title").unwrap(), "§ 6 Beiträge");
        assert_eq!(store.text("prices.stand_date").unwrap(), "01.01.2024");
    }

    #[test]
    fn missing_key_is_content_error() {
        let err = store().text("legal_text.section7.title").unwrap_err();
        assert!(matches!(err, FormError::ContentData { ref key, .. } if key == "legal_text.section7.title"));
    }

    #[test]
    fn wrong_shape_is_content_error() {
        let store = store();
        assert!(matches!(
            store.text("legal_text.section6"),
            Err(FormError::ContentData { .. })
        ));
        assert!(matches!(
            store.text("numbers"),
            Err(FormError::ContentData { .. })
        ));
        assert!(matches!(
            store.price_sheet("legal_text.section6"),
            Err(FormError::ContentData { .. })
        ));
    }

    #[test]
    fn price_sheet_rows_must_match_header() {
        let sheet = store().price_sheet("prices").expect("valid sheet");
        assert_eq!(sheet.rows.len(), 1);

        let broken = ContentStore::from_json(
            r#"{"prices": {"stand_date": "x", "header": ["a", "b"], "rows": [["only one"]]}}"#,
        )
        .unwrap();
        let err = broken.price_sheet("prices").unwrap_err();
        assert!(err.to_string().contains("row 0 has 1 cells"));
    }

    #[test]
    fn unreadable_file_is_asset_error() {
        let err = ContentStore::from_path("/__membership_form_missing__/data.json").unwrap_err();
        assert!(err.is_asset_error());
    }
}
