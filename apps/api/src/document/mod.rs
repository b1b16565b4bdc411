// Resume document model: typed schema, template defaults, the dot-path
// mutation primitive, and the page/column layout grid with its reflow rules.

pub mod defaults;
pub mod layout;
pub mod path;
pub mod schema;

use thiserror::Error;

pub use layout::{Locator, LayoutError};
pub use path::{DotPath, SetOutcome};
pub use schema::{
    FixedSectionKey, Resume, ResumeData, SectionRef, Visibility,
};

/// Errors raised by document mutations and invariant checks.
/// Mutations fail closed: on error the prior snapshot is untouched.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid path `{0}`")]
    InvalidPath(String),

    #[error("document validation failed: {0}")]
    Validation(String),

    #[error("section `{0}` not found or has no item list")]
    SectionNotFound(String),

    #[error("item `{0}` not found")]
    ItemNotFound(String),
}

impl From<LayoutError> for DocumentError {
    fn from(err: LayoutError) -> Self {
        DocumentError::Validation(err.to_string())
    }
}
