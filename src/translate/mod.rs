//! Natural-language questions to SQL through a language model.
//!
//! The model is an opaque [`Translator`]: it receives the system prompt
//! (with the live schema embedded) plus the user's question, and returns
//! `{"query": ..., "error": ...}`. Whatever query comes back is run through
//! the guarded, read-only execution path.

pub mod client;
pub mod prompt;

pub use client::*;
pub use prompt::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::StoreError;
use crate::introspect::describe_schema;
use crate::query::{execute_untrusted, ResultSet};

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid model response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model returned no query")]
    EmptyReply,

    /// The model's own `error` field, passed through unchanged
    #[error("{0}")]
    Model(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The JSON contract the model must answer with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReply {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ModelReply {
    /// Parse a reply, tolerating code fences or prose around the object
    pub fn parse(content: &str) -> Result<Self, TranslateError> {
        let trimmed = content.trim();
        let json = match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if start < end => &trimmed[start..=end],
            _ => trimmed,
        };
        Ok(serde_json::from_str(json)?)
    }

    /// The query to run, or the model's error verbatim
    pub fn into_query(self) -> Result<String, TranslateError> {
        if let Some(error) = self.error.filter(|e| !e.trim().is_empty()) {
            return Err(TranslateError::Model(error));
        }

        self.query
            .filter(|q| !q.trim().is_empty())
            .ok_or(TranslateError::EmptyReply)
    }
}

/// Anything that can turn a question into a [`ModelReply`]
pub trait Translator {
    fn translate(&self, system_prompt: &str, question: &str) -> Result<ModelReply, TranslateError>;
}

/// A question answered: the SQL the model produced and its rows
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub query: String,
    pub rows: ResultSet,
}

/// Describe the schema, ask the model, run its query read-only
pub fn ask(
    config: &Config,
    translator: &impl Translator,
    question: &str,
) -> Result<Answer, TranslateError> {
    let schema = describe_schema(config)?;
    let system_prompt = system_prompt(&schema)?;

    let reply = translator.translate(&system_prompt, question)?;
    debug!(?reply, "model reply");

    let query = reply.into_query()?;
    let rows = execute_untrusted(config, &query)?;

    info!(rows = rows.len(), "answered question");
    Ok(Answer { query, rows })
}
