use serde::{Deserialize, Serialize};

/// Where a document's text came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub source: String,
    /// 1-based position of the document within its source.
    pub line: usize,
}

/// A piece of context text handed to the prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(page_content: impl Into<String>, source: impl Into<String>, line: usize) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: DocumentMetadata {
                source: source.into(),
                line,
            },
        }
    }
}

/// Flatten documents into the text blob substituted for `{context}`.
pub fn format_documents_as_string(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
