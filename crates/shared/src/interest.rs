use serde::{Deserialize, Serialize};
use thiserror::Error;

/// arXiv search field prefixes. Serialized with the provider's short codes
/// so the on-disk config matches what the query string needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryCategory {
    #[serde(rename = "ti")]
    Title,
    #[serde(rename = "abs")]
    Abstract,
    #[serde(rename = "au")]
    Author,
    #[serde(rename = "co")]
    Comment,
    #[serde(rename = "jr")]
    JournalReference,
    #[serde(rename = "cat")]
    SubjectCategory,
    #[serde(rename = "rn")]
    ReportNumber,
    #[serde(rename = "all")]
    All,
}

impl QueryCategory {
    pub const NAMES: [&'static str; 8] = [
        "title",
        "abstract",
        "author",
        "comment",
        "journalreference",
        "subjectcategory",
        "reportnumber",
        "all",
    ];

    /// Short field prefix used in arXiv query strings.
    pub fn code(&self) -> &'static str {
        match self {
            QueryCategory::Title => "ti",
            QueryCategory::Abstract => "abs",
            QueryCategory::Author => "au",
            QueryCategory::Comment => "co",
            QueryCategory::JournalReference => "jr",
            QueryCategory::SubjectCategory => "cat",
            QueryCategory::ReportNumber => "rn",
            QueryCategory::All => "all",
        }
    }

    /// Match a user-entered category name. Case-insensitive; accepts the
    /// full names, underscore-separated spellings ("journal_reference"),
    /// and the short codes themselves ("ti", "abs", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('_', "");
        match normalized.as_str() {
            "title" | "ti" => Some(QueryCategory::Title),
            "abstract" | "abs" => Some(QueryCategory::Abstract),
            "author" | "au" => Some(QueryCategory::Author),
            "comment" | "co" => Some(QueryCategory::Comment),
            "journalreference" | "jr" => Some(QueryCategory::JournalReference),
            "subjectcategory" | "cat" => Some(QueryCategory::SubjectCategory),
            "reportnumber" | "rn" => Some(QueryCategory::ReportNumber),
            "all" => Some(QueryCategory::All),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterestError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("expected 'category:query'")]
    MissingQuery,
}

/// One clause of the search query: an arXiv field plus free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestFilter {
    pub category: QueryCategory,
    pub query: String,
}

impl InterestFilter {
    /// Parse a "category:query" line. Splits on the first colon only, so
    /// query text may itself contain colons. The query text is taken
    /// verbatim; an empty query is accepted.
    pub fn parse(raw: &str) -> Result<Self, InterestError> {
        let (category, query) = raw.split_once(':').ok_or(InterestError::MissingQuery)?;
        let category =
            QueryCategory::from_name(category).ok_or_else(|| {
                InterestError::UnknownCategory(category.trim().to_string())
            })?;
        Ok(Self {
            category,
            query: query.to_string(),
        })
    }
}
