//! Postgres-backed `ResumeStore`.
//!
//! Ownership scoping happens in the WHERE clause of every query, so a
//! foreign resume and a missing resume are the same empty result. Updates
//! merge the patch over the current row in one transaction with the row
//! locked, which keeps the locked-resume check and the write atomic.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::document::defaults::default_resume_data;
use crate::document::{Resume, Visibility};
use crate::errors::AppError;
use crate::models::resume::{PublicResume, ResumeRow};
use crate::models::user::User;
use crate::store::{slugify, ResumePatch, ResumeStore};

pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        PgResumeStore { pool }
    }

    async fn slug_taken(&self, owner: Uuid, slug: &str) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM resumes WHERE user_id = $1 AND slug = $2)",
        )
        .bind(owner)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// First free slug in `base`, `base-2`, `base-3`, …
    async fn probe_slug(&self, owner: Uuid, base: &str) -> Result<String, AppError> {
        if !self.slug_taken(owner, base).await? {
            return Ok(base.to_string());
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if !self.slug_taken(owner, &candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    async fn insert_resume(&self, resume: &Resume) -> Result<Resume, AppError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, ResumeRow>(
            "INSERT INTO resumes (id, user_id, title, slug, data, visibility, locked) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(resume.id)
        .bind(resume.user_id)
        .bind(&resume.title)
        .bind(&resume.slug)
        .bind(Json(&resume.data))
        .bind(resume.visibility.as_str())
        .bind(resume.locked)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO statistics (resume_id, views, downloads) VALUES ($1, 0, 0)")
            .bind(resume.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        row.try_into()
    }
}

/// Merges a patch over the current envelope. Pure so it can be unit-tested
/// away from the database.
pub(crate) fn apply_patch(resume: &mut Resume, patch: ResumePatch) {
    if let Some(title) = patch.title {
        resume.title = title;
    }
    if let Some(slug) = patch.slug {
        resume.slug = slug;
    }
    if let Some(visibility) = patch.visibility {
        resume.visibility = visibility;
    }
    if let Some(data) = patch.data {
        resume.data = data;
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn create(
        &self,
        owner: Uuid,
        title: &str,
        slug: Option<&str>,
        visibility: Option<Visibility>,
    ) -> Result<Resume, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }

        let slug = match slug {
            Some(s) => s.to_string(),
            None => {
                let derived = slugify(title);
                if derived.is_empty() {
                    "resume".to_string()
                } else {
                    derived
                }
            }
        };
        if self.slug_taken(owner, &slug).await? {
            return Err(AppError::Conflict(format!("slug `{slug}` already in use")));
        }

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        let resume = Resume {
            id: Uuid::new_v4(),
            user_id: owner,
            title: title.to_string(),
            slug,
            data: default_resume_data(&user.name, &user.email, user.picture.as_deref().unwrap_or("")),
            visibility: visibility.unwrap_or(Visibility::Private),
            locked: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let created = self.insert_resume(&resume).await?;
        info!(resume_id = %created.id, "resume created");
        Ok(created)
    }

    async fn get(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError> {
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("resume not found".to_string()))?
            .try_into()
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<Resume>, AppError> {
        let rows = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Resume::try_from).collect()
    }

    async fn update(&self, id: Uuid, owner: Uuid, patch: ResumePatch) -> Result<Resume, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("resume not found".to_string()))?;

        let mut current: Resume = row.try_into()?;
        if current.locked {
            return Err(AppError::Conflict("resume is locked".to_string()));
        }

        if let Some(slug) = patch.slug.as_deref() {
            if slug != current.slug {
                let taken: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM resumes WHERE user_id = $1 AND slug = $2 AND id <> $3)",
                )
                .bind(owner)
                .bind(slug)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                if taken {
                    return Err(AppError::Conflict(format!("slug `{slug}` already in use")));
                }
            }
        }

        apply_patch(&mut current, patch);
        current.data.validate().map_err(AppError::from)?;

        let row = sqlx::query_as::<_, ResumeRow>(
            "UPDATE resumes \
             SET title = $3, slug = $4, data = $5, visibility = $6, updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .bind(&current.title)
        .bind(&current.slug)
        .bind(Json(&current.data))
        .bind(current.visibility.as_str())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM statistics WHERE resume_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("resume not found".to_string()));
        }
        tx.commit().await?;
        info!(resume_id = %id, "resume deleted");
        Ok(())
    }

    async fn duplicate(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError> {
        let source = self.get(id, owner).await?;

        let slug = self.probe_slug(owner, &format!("{}-copy", source.slug)).await?;
        let copy = Resume {
            id: Uuid::new_v4(),
            title: format!("{} (Copy)", source.title),
            slug,
            visibility: Visibility::Private,
            locked: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            ..source
        };

        self.insert_resume(&copy).await
    }

    async fn set_lock(&self, id: Uuid, owner: Uuid, locked: bool) -> Result<Resume, AppError> {
        sqlx::query_as::<_, ResumeRow>(
            "UPDATE resumes SET locked = $3, updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .bind(locked)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("resume not found".to_string()))?
        .try_into()
    }

    async fn get_public(&self, username: &str, slug: &str) -> Result<PublicResume, AppError> {
        // Private and nonexistent look identical from the outside.
        let row = sqlx::query_as::<_, ResumeRow>(
            "SELECT r.* FROM resumes r \
             JOIN users u ON u.id = r.user_id \
             WHERE u.username = $1 AND r.slug = $2 AND r.visibility = 'public'",
        )
        .bind(username)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("resume not found".to_string()))?;

        let resume: Resume = row.try_into()?;
        Ok(PublicResume::from_resume(resume))
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE statistics SET views = views + 1 WHERE resume_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_downloads(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE statistics SET downloads = downloads + 1 WHERE resume_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn resume() -> Resume {
        Resume {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Main".to_string(),
            slug: "main".to_string(),
            data: default_resume_data("Ada", "ada@example.com", ""),
            visibility: Visibility::Private,
            locked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_patch_merges_present_fields_only() {
        let mut current = resume();
        let original_slug = current.slug.clone();

        apply_patch(
            &mut current,
            ResumePatch {
                title: Some("Renamed".to_string()),
                visibility: Some(Visibility::Public),
                ..Default::default()
            },
        );

        assert_eq!(current.title, "Renamed");
        assert_eq!(current.visibility, Visibility::Public);
        assert_eq!(current.slug, original_slug);
    }

    #[test]
    fn test_apply_patch_empty_is_identity() {
        let mut current = resume();
        let before = current.clone();
        apply_patch(&mut current, ResumePatch::default());
        assert_eq!(current.title, before.title);
        assert_eq!(current.data, before.data);
    }
}
