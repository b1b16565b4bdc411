#![allow(dead_code)]

//! Database row shapes for resumes and their statistics, plus the redacted
//! shape the public endpoint serves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::document::{Resume, ResumeData, Visibility};
use crate::errors::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub data: Json<ResumeData>,
    pub visibility: String,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ResumeRow> for Resume {
    type Error = AppError;

    fn try_from(row: ResumeRow) -> Result<Self, Self::Error> {
        let visibility: Visibility = row
            .visibility
            .parse()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("bad visibility in row {}", row.id)))?;
        Ok(Resume {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            slug: row.slug,
            data: row.data.0,
            visibility,
            locked: row.locked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StatisticsRow {
    pub resume_id: Uuid,
    pub views: i64,
    pub downloads: i64,
}

/// What the public endpoint serves: the document with `metadata.notes`
/// redacted, plus the display fields. The owner id never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicResume {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub data: ResumeData,
    pub updated_at: DateTime<Utc>,
}

impl PublicResume {
    /// Builds the public shape, stripping the owner's private notes.
    pub fn from_resume(resume: Resume) -> Self {
        let mut data = resume.data;
        data.metadata.notes.clear();
        PublicResume {
            id: resume.id,
            title: resume.title,
            slug: resume.slug,
            data,
            updated_at: resume.updated_at,
        }
    }
}
