//! Document types and builder
//!
//! Core types for documents stored in the similarity store.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for documents within a namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an id from a caller-supplied string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an id from a write timestamp
    ///
    /// Used when the caller supplies no id of their own.
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        Self(format!("doc_{}", timestamp.timestamp_millis()))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Sentiment attached to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Friendly,
    #[default]
    Neutral,
    Analytical,
    Negative,
}

/// A document stored for similarity search
///
/// Documents are immutable once written: the similarity store exposes
/// insert and search only. `id` and `timestamp` are optional at build time;
/// the context manager fills both before storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Caller-supplied id, or time-derived when absent at write time
    pub id: Option<DocumentId>,
    /// Full text of the document
    pub text: String,
    /// Topic labels
    #[serde(default)]
    pub topics: BTreeSet<String>,
    /// Sentiment classification
    #[serde(default)]
    pub sentiment: Sentiment,
    /// When the document was produced
    pub timestamp: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a new builder for Document
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }
}

/// Builder for Document with fluent API
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    id: Option<DocumentId>,
    text: Option<String>,
    topics: BTreeSet<String>,
    sentiment: Sentiment,
    timestamp: Option<DateTime<Utc>>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document id (time-derived at write time if not set)
    pub fn id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the document text (required; the empty string is allowed)
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add a topic label
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.insert(topic.into());
        self
    }

    /// Set multiple topic labels
    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Set the sentiment
    pub fn sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Set the timestamp (drawn from the write clock if not set)
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the Document
    pub fn build(self) -> Result<Document, DocumentBuilderError> {
        let text = self.text.ok_or(DocumentBuilderError::MissingText)?;

        Ok(Document {
            id: self.id,
            text,
            topics: self.topics,
            sentiment: self.sentiment,
            timestamp: self.timestamp,
        })
    }
}

/// Errors that can occur when building a Document
#[derive(Debug, thiserror::Error)]
pub enum DocumentBuilderError {
    #[error("Missing required field: text")]
    MissingText,
}
