#![allow(dead_code)]

//! Autosave controller: debounced, coalescing persistence of the open
//! document.
//!
//! The hard invariant is at most one in-flight write per document. A change
//! arriving mid-write sets a pending flag instead of racing a second write;
//! the outcome of the finished write tells the caller to re-trigger with
//! fresh state. Saves are no-ops when nothing observable changed, and a
//! locked resume short-circuits before any store call. Failures keep the
//! controller's state so the next natural change retries; there is no
//! dedicated retry timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::document::{Resume, ResumeData, Visibility};
use crate::errors::AppError;
use crate::store::{ResumePatch, ResumeStore};

/// Quiet period after the last change before a save fires.
pub const DEBOUNCE_QUIET: Duration = Duration::from_secs(2);
/// Hard ceiling: a save fires at most this long after the first unsaved
/// change, however fast edits keep arriving.
pub const DEBOUNCE_CEILING: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written; nothing arrived meanwhile.
    Saved,
    /// Written, but a change arrived mid-write. Re-trigger with fresh state.
    SavedWithPending,
    /// Identical to the last written snapshot; no store call made.
    Unchanged,
    /// A write is already in flight; this change was folded into it.
    Coalesced,
    /// The resume is locked; no store call made.
    Locked,
}

/// The observable fields a save persists. Two snapshots serializing the same
/// here are the same save.
#[derive(Serialize)]
struct Fingerprint<'a> {
    title: &'a str,
    visibility: Visibility,
    data: &'a ResumeData,
}

fn fingerprint(resume: &Resume) -> Result<String, AppError> {
    let fp = Fingerprint {
        title: &resume.title,
        visibility: resume.visibility,
        data: &resume.data,
    };
    serde_json::to_string(&fp).map_err(|e| AppError::Internal(e.into()))
}

#[derive(Default)]
struct SaveState {
    is_saving: bool,
    pending_save: bool,
    last_saved: Option<String>,
    last_saved_at: Option<DateTime<Utc>>,
}

pub struct AutoSave {
    store: Arc<dyn ResumeStore>,
    // Never held across an await.
    state: Mutex<SaveState>,
}

impl AutoSave {
    pub fn new(store: Arc<dyn ResumeStore>) -> Self {
        AutoSave {
            store,
            state: Mutex::new(SaveState::default()),
        }
    }

    pub fn is_saving(&self) -> bool {
        self.state.lock().unwrap().is_saving
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().last_saved_at
    }

    /// Attempts to persist `resume`. See `SaveOutcome` for the possible
    /// resolutions; only `Saved`/`SavedWithPending` reached the store.
    pub async fn trigger_save(&self, resume: &Resume) -> Result<SaveOutcome, AppError> {
        let fp = fingerprint(resume)?;

        {
            let mut state = self.state.lock().unwrap();
            if state.last_saved.as_deref() == Some(fp.as_str()) {
                return Ok(SaveOutcome::Unchanged);
            }
            if resume.locked {
                return Ok(SaveOutcome::Locked);
            }
            if state.is_saving {
                state.pending_save = true;
                return Ok(SaveOutcome::Coalesced);
            }
            state.is_saving = true;
        }

        let patch = ResumePatch {
            title: Some(resume.title.clone()),
            visibility: Some(resume.visibility),
            data: Some(resume.data.clone()),
            ..Default::default()
        };
        let result = self.store.update(resume.id, resume.user_id, patch).await;

        let mut state = self.state.lock().unwrap();
        state.is_saving = false;
        match result {
            Ok(_) => {
                state.last_saved = Some(fp);
                state.last_saved_at = Some(Utc::now());
                if std::mem::take(&mut state.pending_save) {
                    Ok(SaveOutcome::SavedWithPending)
                } else {
                    Ok(SaveOutcome::Saved)
                }
            }
            // last_saved stays stale so the next change retries the write.
            Err(e) => Err(e),
        }
    }

    /// Immediate save, bypassing the debounce. Used on editor exit.
    pub async fn flush(&self, resume: &Resume) -> Result<SaveOutcome, AppError> {
        self.trigger_save(resume).await
    }
}

/// Debounced autosave loop. Feed document snapshots through the watch
/// channel; the loop saves after `DEBOUNCE_QUIET` of silence, or at
/// `DEBOUNCE_CEILING` after the first unsaved change when edits keep
/// streaming. Dropping the sender flushes the final snapshot and exits.
pub async fn run_debounced(autosave: Arc<AutoSave>, mut rx: watch::Receiver<Option<Resume>>) {
    loop {
        if rx.changed().await.is_err() {
            break;
        }

        let quiet = tokio::time::sleep(DEBOUNCE_QUIET);
        let ceiling = tokio::time::sleep(DEBOUNCE_CEILING);
        tokio::pin!(quiet, ceiling);
        let mut closed = false;

        loop {
            tokio::select! {
                _ = &mut quiet => break,
                _ = &mut ceiling => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        closed = true;
                        break;
                    }
                    quiet.as_mut().reset(Instant::now() + DEBOUNCE_QUIET);
                }
            }
        }

        save_latest(&autosave, &mut rx).await;
        if closed {
            return;
        }
    }

    // Exit flush: the editor went away with a possibly-unsaved snapshot.
    save_latest(&autosave, &mut rx).await;
}

async fn save_latest(autosave: &AutoSave, rx: &mut watch::Receiver<Option<Resume>>) {
    let snapshot = rx.borrow_and_update().clone();
    let Some(resume) = snapshot else { return };

    match autosave.trigger_save(&resume).await {
        Ok(SaveOutcome::SavedWithPending) => {
            // A change landed mid-write; pick up the fresh snapshot now.
            let fresh = rx.borrow_and_update().clone();
            if let Some(fresh) = fresh {
                if let Err(e) = autosave.trigger_save(&fresh).await {
                    warn!(error = %e, "autosave retry failed");
                }
            }
        }
        Ok(outcome) => debug!(?outcome, "autosave"),
        Err(e) => warn!(error = %e, "autosave failed"),
    }
}
