//! Static JSON dataset loader.
//!
//! String values are pulled out of the dataset with JSON pointers. At every
//! object the pointers are tried first; when any of them resolves, all strings
//! under the resolved values become documents. Otherwise the loader descends
//! into the object's values, so the same pointers work for a single record
//! and for an array of records.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{ContextSource, Document};
use crate::error::{AiError, Result};

/// Fields of the supplements dataset used as prompt context.
pub const DATASET_POINTERS: [&str; 4] = [
    "/Allergies",
    "/Symptoms",
    "/Recommended Supplements",
    "/Additional Notes",
];

#[derive(Debug, Clone)]
pub struct JsonLoader {
    path: PathBuf,
    pointers: Vec<String>,
}

impl JsonLoader {
    pub fn new(path: impl Into<PathBuf>, pointers: &[&str]) -> Self {
        Self {
            path: path.into(),
            pointers: pointers.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Loader for the supplements dataset fields.
    pub fn dataset(path: impl Into<PathBuf>) -> Self {
        Self::new(path, &DATASET_POINTERS)
    }

    /// Parse raw JSON text into documents.
    pub fn parse(&self, raw: &str) -> Result<Vec<Document>> {
        let json: Value = serde_json::from_str(raw.trim()).map_err(|e| {
            AiError::Context(format!("Invalid JSON in {}: {}", self.path.display(), e))
        })?;

        let mut texts = Vec::new();
        self.extract(&json, self.pointers.is_empty(), &mut texts);

        let source = self.path.display().to_string();
        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Document::new(text, source.clone(), i + 1))
            .collect())
    }

    fn extract(&self, json: &Value, extract_all: bool, out: &mut Vec<String>) {
        match json {
            Value::String(s) if extract_all && !s.is_empty() => out.push(s.clone()),
            Value::Array(items) => {
                for item in items {
                    self.extract(item, extract_all, out);
                }
            }
            Value::Object(map) => {
                if extract_all {
                    for value in map.values() {
                        self.extract(value, true, out);
                    }
                    return;
                }

                let targeted: Vec<&Value> = self
                    .pointers
                    .iter()
                    .filter_map(|pointer| json.pointer(pointer))
                    .collect();

                if targeted.is_empty() {
                    for value in map.values() {
                        self.extract(value, false, out);
                    }
                } else {
                    for value in targeted {
                        self.extract(value, true, out);
                    }
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl ContextSource for JsonLoader {
    async fn load(&self) -> Result<Vec<Document>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AiError::Context(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let documents = self.parse(&raw)?;
        tracing::debug!(
            path = %self.path.display(),
            documents = documents.len(),
            "Loaded context documents"
        );
        Ok(documents)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn contents(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.page_content.as_str()).collect()
    }

    #[test]
    fn test_array_of_records_in_record_then_pointer_order() {
        let loader = JsonLoader::dataset("dataset.json");
        let raw = r#"[
            {"Allergies": "Shellfish", "Symptoms": ["Fatigue", "Brain fog"],
             "Recommended Supplements": "Vitamin B12", "Additional Notes": "Take with food",
             "Id": "ignored"},
            {"Symptoms": "Insomnia", "Allergies": "None", "Recommended Supplements": "Magnesium glycinate",
             "Additional Notes": ""}
        ]"#;

        let docs = loader.parse(raw).unwrap();
        assert_eq!(
            contents(&docs),
            vec![
                "Shellfish",
                "Fatigue",
                "Brain fog",
                "Vitamin B12",
                "Take with food",
                "None",
                "Insomnia",
                "Magnesium glycinate",
            ]
        );
        assert_eq!(docs[0].metadata.line, 1);
        assert_eq!(docs[7].metadata.line, 8);
        assert_eq!(docs[0].metadata.source, "dataset.json");
    }

    #[test]
    fn test_nested_records_are_found() {
        let loader = JsonLoader::new("d.json", &["/Symptoms"]);
        let raw = r#"{"records": [{"Symptoms": {"primary": "Headache"}}], "title": "skip"}"#;
        let docs = loader.parse(raw).unwrap();
        assert_eq!(contents(&docs), vec!["Headache"]);
    }

    #[test]
    fn test_no_pointers_extracts_every_string() {
        let loader = JsonLoader::new("d.json", &[]);
        let docs = loader.parse(r#"{"a": "x", "b": [1, "y", {"c": "z"}]}"#).unwrap();
        assert_eq!(contents(&docs), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_invalid_json_is_context_error() {
        let loader = JsonLoader::dataset("broken.json");
        let err = loader.parse("{not json").unwrap_err();
        assert!(matches!(err, AiError::Context(_)));
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Allergies": "Gluten"}}"#).unwrap();

        let loader = JsonLoader::dataset(file.path());
        let docs = loader.load().await.unwrap();
        assert_eq!(contents(&docs), vec!["Gluten"]);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let loader = JsonLoader::dataset("/nonexistent/vitabot/dataset.json");
        assert!(matches!(loader.load().await, Err(AiError::Context(_))));
    }
}
