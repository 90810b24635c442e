//! Term types and the term-gap query
//!
//! Terms live in a companion store; the index only needs to know which
//! (entity, term type, language) combinations exist.

use crate::error::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default page size for term-gap scans
pub const DEFAULT_TERM_GAP_LIMIT: usize = 50;

/// Kind of a language-tagged term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermType {
    Label,
    Description,
    Alias,
}

impl TermType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermType::Label => "label",
            TermType::Description => "description",
            TermType::Alias => "alias",
        }
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TermType {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(TermType::Label),
            "description" => Ok(TermType::Description),
            "alias" => Ok(TermType::Alias),
            other => Err(IndexError::InvalidInput(format!("unknown term type: {other}"))),
        }
    }
}

/// A single term attached to an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub term_type: TermType,
    pub language: String,
    pub text: String,
}

impl Term {
    pub fn new(term_type: TermType, language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            term_type,
            language: language.into(),
            text: text.into(),
        }
    }

    pub fn label(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(TermType::Label, language, text)
    }

    pub fn description(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(TermType::Description, language, text)
    }
}

/// Parameters for finding entities that lack a term
///
/// Results are ordered by descending page id and paged by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermGapQuery {
    pub term_type: TermType,
    pub language: Option<String>,
    pub entity_type: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl TermGapQuery {
    pub fn new(term_type: TermType) -> Self {
        Self {
            term_type,
            language: None,
            entity_type: None,
            limit: DEFAULT_TERM_GAP_LIMIT,
            offset: 0,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Reject queries no backend should run
    pub fn validate(&self) -> IndexResult<()> {
        if self.limit == 0 {
            return Err(IndexError::invalid_input("limit must be a positive integer"));
        }
        if self.entity_type.as_deref() == Some("") {
            return Err(IndexError::invalid_input("entity type filter must not be empty"));
        }
        Ok(())
    }
}
