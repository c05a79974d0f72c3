//! Editor form state and client-side validation.
//!
//! The form carries the author as free text; it becomes a [`PaperDraft`]
//! only once the name has been resolved to an [`AuthorId`].

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::model::{Author, AuthorId, Paper, PaperDraft, PaperType};

pub const TITLE_MIN: usize = 8;
pub const TITLE_MAX: usize = 128;
pub const AUTHOR_NAME_MIN: usize = 4;
pub const AUTHOR_NAME_MAX: usize = 64;
pub const CATEGORY_MAX: usize = 64;

pub const EMPTY_INPUT: &str = "Input cannot be empty!";

/// Paper as edited by a user, before author resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperForm {
    pub title: String,
    pub body: String,
    pub author_name: String,
    pub kind: PaperType,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl Default for PaperForm {
    fn default() -> Self {
        Self {
            title: "Untitled Page".to_string(),
            body: String::new(),
            author_name: String::new(),
            kind: PaperType::Article,
            category: None,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Body,
    Author,
    Category,
    Tags,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::Author => "author",
            Self::Category => "category",
            Self::Tags => "tags",
        })
    }
}

/// One problem with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every field problem found in a form, in field order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// First message reported for `field`, for inline display.
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn has(&self, field: Field) -> bool {
        self.for_field(field).is_some()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn check_length(
    errors: &mut Vec<FieldError>,
    field: Field,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.push(FieldError {
            field,
            message: EMPTY_INPUT.to_string(),
        });
    } else if len < min {
        errors.push(FieldError {
            field,
            message: format!("must be at least {min} characters"),
        });
    } else if len > max {
        errors.push(FieldError {
            field,
            message: format!("must be at most {max} characters"),
        });
    }
}

impl PaperForm {
    /// Pre-fill a form from a cached paper. The author is shown by name;
    /// an author missing from the cache yields an empty name.
    pub fn from_paper(paper: &Paper, authors: &HashMap<AuthorId, Author>) -> Self {
        Self {
            title: paper.title.clone(),
            body: paper.body.clone(),
            author_name: authors
                .get(&paper.author)
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            kind: paper.kind,
            category: paper.category.clone(),
            tags: paper.tags.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        check_length(&mut errors, Field::Title, &self.title, TITLE_MIN, TITLE_MAX);
        if self.body.trim().is_empty() {
            errors.push(FieldError {
                field: Field::Body,
                message: EMPTY_INPUT.to_string(),
            });
        }
        check_length(
            &mut errors,
            Field::Author,
            &self.author_name,
            AUTHOR_NAME_MIN,
            AUTHOR_NAME_MAX,
        );
        if let Some(category) = &self.category
            && category.trim().chars().count() > CATEGORY_MAX
        {
            errors.push(FieldError {
                field: Field::Category,
                message: format!("must be at most {CATEGORY_MAX} characters"),
            });
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            errors.push(FieldError {
                field: Field::Tags,
                message: "tags cannot be empty".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }

    /// Build the request body once the author has been resolved.
    ///
    /// Text fields are sent trimmed, as they were validated. The body only
    /// loses trailing whitespace since leading indentation is markdown. An
    /// empty category is sent as absent.
    pub fn into_draft(self, author: AuthorId) -> PaperDraft {
        PaperDraft {
            title: self.title.trim().to_string(),
            body: self.body.trim_end().to_string(),
            kind: self.kind,
            author,
            category: self
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            tags: self.tags.iter().map(|t| t.trim().to_string()).collect(),
        }
    }
}
