//! Resume persistence — trait-based store so handlers and the autosave
//! controller never touch SQL directly.
//!
//! `AppState` holds an `Arc<dyn ResumeStore>`, swapped at startup (Postgres
//! in production, an in-memory double in tests).

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::document::{Resume, ResumeData, Visibility};
use crate::errors::AppError;
use crate::models::resume::PublicResume;

/// The fields a resume update may carry. `None` means "leave unchanged";
/// the store assembles a partial SQL update from whatever is present.
#[derive(Debug, Clone, Default)]
pub struct ResumePatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub visibility: Option<Visibility>,
    pub data: Option<ResumeData>,
}

impl ResumePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.visibility.is_none()
            && self.data.is_none()
    }
}

/// Persistence contract for resumes.
///
/// Ownership is enforced here: every id-addressed operation takes the
/// caller's user id, and a resume belonging to someone else is reported as
/// `NotFound` — indistinguishable from a resume that does not exist.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Creates a resume with the template defaults, derives a slug from the
    /// title when none is given, and seeds its statistics row.
    async fn create(
        &self,
        owner: Uuid,
        title: &str,
        slug: Option<&str>,
        visibility: Option<Visibility>,
    ) -> Result<Resume, AppError>;

    async fn get(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError>;

    async fn list(&self, owner: Uuid) -> Result<Vec<Resume>, AppError>;

    /// Applies a partial update. A locked resume rejects the write with
    /// `Conflict` before anything is touched.
    async fn update(&self, id: Uuid, owner: Uuid, patch: ResumePatch) -> Result<Resume, AppError>;

    /// Deletes the resume and its statistics row.
    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<(), AppError>;

    /// Clones the resume under a `-copy` slug (probing `-copy-2`, `-copy-3`,
    /// … until free), titled "<title> (Copy)", visibility reset to private.
    async fn duplicate(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError>;

    async fn set_lock(&self, id: Uuid, owner: Uuid, locked: bool) -> Result<Resume, AppError>;

    /// Public lookup by username and slug. Only publicly visible resumes
    /// resolve; `metadata.notes` is redacted from the returned document.
    async fn get_public(&self, username: &str, slug: &str) -> Result<PublicResume, AppError>;

    async fn increment_views(&self, id: Uuid) -> Result<(), AppError>;

    async fn increment_downloads(&self, id: Uuid) -> Result<(), AppError>;
}

/// Derives a URL slug from a title: lowercase, alphanumerics kept, runs of
/// anything else collapsed to single hyphens, trimmed at both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Software Engineer"), "software-engineer");
        assert_eq!(slugify("  Staff  SRE  "), "staff-sre");
        assert_eq!(slugify("C++ / Rust Dev!"), "c-rust-dev");
    }

    #[test]
    fn test_slugify_preserves_digits() {
        assert_eq!(slugify("Resume 2026 (v2)"), "resume-2026-v2");
    }

    #[test]
    fn test_slugify_degenerate_titles() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_patch_emptiness() {
        assert!(ResumePatch::default().is_empty());
        let patch = ResumePatch {
            title: Some("x".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
