//! Prompt templates with `{variable}` placeholders.
//!
//! `{{` and `}}` render as literal braces. Every placeholder must be given a
//! value; unused values are ignored.

use std::collections::{BTreeSet, HashMap};

use crate::error::{AiError, Result};

/// Template used by the chat endpoint.
pub const VITABOT_TEMPLATE: &str = "Answer the user's questions based only on the following context:
==============================
Context: {context}
==============================
Current conversation: {chat_history}

user: {question}
==============================
Please provide a detailed and accurate response based on the context above. If the context does not contain enough information to answer the question, indicate that more information is needed.
==============================
assistant:";

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Variable(String),
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn from_template(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    let name = name.trim();
                    if !closed {
                        return Err(AiError::Template(format!(
                            "Unclosed placeholder '{{{}'",
                            name
                        )));
                    }
                    if name.is_empty() || name.contains('{') {
                        return Err(AiError::Template(format!(
                            "Invalid placeholder name '{}'",
                            name
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(name.to_string()));
                }
                '}' => {
                    return Err(AiError::Template(
                        "Single '}' in template; use '}}' for a literal brace".to_string(),
                    ));
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Placeholder names, sorted and de-duplicated.
    pub fn input_variables(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn format(&self, values: &HashMap<&str, String>) -> Result<String> {
        let missing: Vec<&str> = self
            .input_variables()
            .into_iter()
            .filter(|name| !values.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(AiError::Template(format!(
                "Missing value for template variables: {}",
                missing.join(", ")
            )));
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    if let Some(value) = values.get(name.as_str()) {
                        out.push_str(value);
                    }
                }
            }
        }
        Ok(out)
    }
}
