#![allow(dead_code)]

//! Artboard-side half of the sync channel: the render surface's view of the
//! document plus its view-control state (zoom, pan, centering) and the
//! font-readiness gate the capture pass waits on.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::document::ResumeData;
use crate::sync::messages::{ArtboardMessage, Envelope};

pub const ZOOM_STEP: f64 = 0.2;
pub const ZOOM_MIN: f64 = 0.4;
pub const ZOOM_MAX: f64 = 2.0;
pub const ZOOM_INITIAL: f64 = 0.8;

/// How long a capture waits for webfonts before proceeding with fallbacks.
pub const FONT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Artboard {
    expected_origin: String,
    resume: Option<ResumeData>,
    scale: f64,
    pan_mode: bool,
    /// True once the view was explicitly centered (or reset, which centers).
    centered: bool,
    fonts_tx: watch::Sender<bool>,
    ignored_envelopes: u64,
}

impl Artboard {
    pub fn new(expected_origin: impl Into<String>) -> Self {
        let (fonts_tx, _) = watch::channel(false);
        Artboard {
            expected_origin: expected_origin.into(),
            resume: None,
            scale: ZOOM_INITIAL,
            pan_mode: false,
            centered: false,
            fonts_tx,
            ignored_envelopes: 0,
        }
    }

    pub fn resume(&self) -> Option<&ResumeData> {
        self.resume.as_ref()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan_mode(&self) -> bool {
        self.pan_mode
    }

    pub fn is_centered(&self) -> bool {
        self.centered
    }

    pub fn ignored_envelopes(&self) -> u64 {
        self.ignored_envelopes
    }

    /// Applies an envelope from the host. Wrong origins are dropped and
    /// counted. A document push replaces the whole local copy.
    pub fn handle(&mut self, envelope: Envelope) {
        if envelope.origin != self.expected_origin {
            self.ignored_envelopes += 1;
            warn!(origin = %envelope.origin, "dropping envelope from unexpected origin");
            return;
        }

        match envelope.message {
            ArtboardMessage::Snapshot { payload } => {
                self.resume = Some(*payload);
            }
            ArtboardMessage::ZoomIn => {
                self.scale = (self.scale + ZOOM_STEP).min(ZOOM_MAX);
            }
            ArtboardMessage::ZoomOut => {
                self.scale = (self.scale - ZOOM_STEP).max(ZOOM_MIN);
            }
            ArtboardMessage::CenterView => {
                self.centered = true;
            }
            ArtboardMessage::ResetView => {
                self.scale = ZOOM_INITIAL;
                self.centered = true;
            }
            ArtboardMessage::SetPanMode { pan_mode } => {
                self.pan_mode = pan_mode;
            }
            ArtboardMessage::Ready => {
                debug!("ignoring READY echoed back to the artboard");
            }
        }
        // Any interaction other than an explicit center leaves the viewport
        // where the user put it.
    }

    /// Marks webfonts as loaded, releasing any capture waiting on them.
    pub fn mark_fonts_loaded(&self) {
        let _ = self.fonts_tx.send(true);
    }

    pub fn fonts_loaded(&self) -> bool {
        *self.fonts_tx.borrow()
    }

    /// Waits until fonts are loaded or `timeout` expires. Returns whether
    /// fonts actually loaded; an expiry is a degraded capture, not an error.
    pub async fn wait_fonts_loaded(&self, timeout: Duration) -> bool {
        let mut rx = self.fonts_tx.subscribe();
        if *rx.borrow_and_update() {
            return true;
        }
        match tokio::time::timeout(timeout, rx.changed()).await {
            Ok(Ok(())) => *rx.borrow(),
            _ => {
                warn!("fonts not ready in time, capturing with fallback fonts");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::defaults::default_resume_data;

    const ORIGIN: &str = "https://builder.example";

    fn from_host(message: ArtboardMessage) -> Envelope {
        Envelope::new(ORIGIN, message)
    }

    fn artboard() -> Artboard {
        Artboard::new(ORIGIN)
    }

    #[test]
    fn test_snapshot_replaces_whole_copy() {
        let mut board = artboard();
        assert!(board.resume().is_none());

        let first = default_resume_data("Ada", "ada@example.com", "");
        board.handle(from_host(ArtboardMessage::Snapshot {
            payload: Box::new(first),
        }));
        assert_eq!(board.resume().unwrap().basics.name, "Ada");

        let mut second = default_resume_data("Grace", "grace@example.com", "");
        second.sections.custom.clear();
        board.handle(from_host(ArtboardMessage::Snapshot {
            payload: Box::new(second),
        }));
        assert_eq!(board.resume().unwrap().basics.name, "Grace");
    }

    #[test]
    fn test_zoom_steps_and_clamps() {
        let mut board = artboard();
        assert_eq!(board.scale(), ZOOM_INITIAL);

        board.handle(from_host(ArtboardMessage::ZoomIn));
        assert!((board.scale() - 1.0).abs() < 1e-9);

        for _ in 0..20 {
            board.handle(from_host(ArtboardMessage::ZoomIn));
        }
        assert_eq!(board.scale(), ZOOM_MAX);

        for _ in 0..20 {
            board.handle(from_host(ArtboardMessage::ZoomOut));
        }
        assert_eq!(board.scale(), ZOOM_MIN);
    }

    #[test]
    fn test_reset_view_restores_initial_zoom_and_centers() {
        let mut board = artboard();
        board.handle(from_host(ArtboardMessage::ZoomIn));
        board.handle(from_host(ArtboardMessage::SetPanMode { pan_mode: true }));

        board.handle(from_host(ArtboardMessage::ResetView));
        assert_eq!(board.scale(), ZOOM_INITIAL);
        assert!(board.is_centered());
        // Pan mode is a mode, not viewport state; reset leaves it alone.
        assert!(board.pan_mode());
    }

    #[test]
    fn test_wrong_origin_dropped() {
        let mut board = artboard();
        board.handle(Envelope::new(
            "https://evil.example",
            ArtboardMessage::Snapshot {
                payload: Box::new(ResumeData::default()),
            },
        ));
        assert!(board.resume().is_none());
        assert_eq!(board.ignored_envelopes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_font_gate_releases_waiters() {
        let board = std::sync::Arc::new(artboard());
        let waiter = {
            let board = board.clone();
            tokio::spawn(async move { board.wait_fonts_loaded(FONT_WAIT_TIMEOUT).await })
        };
        tokio::task::yield_now().await;

        board.mark_fonts_loaded();
        assert!(waiter.await.unwrap());
        assert!(board.fonts_loaded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_font_gate_times_out_to_fallback() {
        let board = artboard();
        let loaded = board.wait_fonts_loaded(Duration::from_secs(10)).await;
        assert!(!loaded);
    }
}
