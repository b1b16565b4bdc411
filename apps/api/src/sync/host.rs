#![allow(dead_code)]

//! Builder-side half of the sync channel.
//!
//! The host owns the document of record and never reads state back from the
//! artboard: once the artboard signals READY, every change on the host side
//! becomes a fire-and-forget full-snapshot push. Handshake and pushes are
//! pure state transitions returning the outbound message, so the transport
//! (iframe bridge, websocket, test harness) stays out of this module.

use tracing::{debug, warn};

use crate::document::ResumeData;
use crate::sync::messages::{ArtboardMessage, Envelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No READY seen yet; pushes are dropped.
    Uninitialized,
    /// READY received, initial snapshot not yet produced.
    Syncing,
    /// Initial snapshot pushed; steady-state change pushes.
    Synced,
}

pub struct PreviewHost {
    expected_origin: String,
    phase: SyncPhase,
    ignored_envelopes: u64,
}

impl PreviewHost {
    pub fn new(expected_origin: impl Into<String>) -> Self {
        PreviewHost {
            expected_origin: expected_origin.into(),
            phase: SyncPhase::Uninitialized,
            ignored_envelopes: 0,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Envelopes dropped for carrying the wrong origin.
    pub fn ignored_envelopes(&self) -> u64 {
        self.ignored_envelopes
    }

    /// Handles an envelope from the artboard. Returns the outbound message
    /// to send, if any. Wrong-origin envelopes are counted and dropped,
    /// never errors.
    pub fn handle(&mut self, envelope: &Envelope, current: &ResumeData) -> Option<ArtboardMessage> {
        if envelope.origin != self.expected_origin {
            self.ignored_envelopes += 1;
            warn!(origin = %envelope.origin, "dropping envelope from unexpected origin");
            return None;
        }

        match &envelope.message {
            ArtboardMessage::Ready => {
                self.phase = SyncPhase::Syncing;
                let push = self.push(current);
                debug!("artboard ready, pushing initial snapshot");
                push
            }
            other => {
                debug!(?other, "ignoring non-handshake message on host side");
                None
            }
        }
    }

    /// Produces the push for a document change. Before the handshake there
    /// is nobody to push to and the change is dropped; the READY reply will
    /// carry the then-current snapshot anyway.
    pub fn push(&mut self, current: &ResumeData) -> Option<ArtboardMessage> {
        match self.phase {
            SyncPhase::Uninitialized => None,
            SyncPhase::Syncing | SyncPhase::Synced => {
                self.phase = SyncPhase::Synced;
                Some(ArtboardMessage::Snapshot {
                    payload: Box::new(current.clone()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::defaults::default_resume_data;

    const ORIGIN: &str = "https://artboard.example";

    fn ready_from(origin: &str) -> Envelope {
        Envelope::new(origin, ArtboardMessage::Ready)
    }

    #[test]
    fn test_handshake_pushes_initial_snapshot() {
        let mut host = PreviewHost::new(ORIGIN);
        let data = default_resume_data("Ada", "ada@example.com", "");
        assert_eq!(host.phase(), SyncPhase::Uninitialized);

        let reply = host.handle(&ready_from(ORIGIN), &data).unwrap();
        assert!(matches!(reply, ArtboardMessage::Snapshot { payload } if *payload == data));
        assert_eq!(host.phase(), SyncPhase::Synced);
    }

    #[test]
    fn test_wrong_origin_counted_not_errored() {
        let mut host = PreviewHost::new(ORIGIN);
        let data = ResumeData::default();

        let reply = host.handle(&ready_from("https://evil.example"), &data);
        assert!(reply.is_none());
        assert_eq!(host.phase(), SyncPhase::Uninitialized);
        assert_eq!(host.ignored_envelopes(), 1);
    }

    #[test]
    fn test_push_before_handshake_is_dropped() {
        let mut host = PreviewHost::new(ORIGIN);
        assert!(host.push(&ResumeData::default()).is_none());
    }

    #[test]
    fn test_every_change_pushes_full_snapshot() {
        let mut host = PreviewHost::new(ORIGIN);
        let mut data = default_resume_data("Ada", "ada@example.com", "");
        host.handle(&ready_from(ORIGIN), &data);

        data.basics.headline = "Analyst".to_string();
        let push = host.push(&data).unwrap();
        match push {
            ArtboardMessage::Snapshot { payload } => {
                assert_eq!(payload.basics.headline, "Analyst");
            }
            other => panic!("expected snapshot push, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_ready_resyncs() {
        // An artboard reload sends READY again; the host just re-pushes.
        let mut host = PreviewHost::new(ORIGIN);
        let data = ResumeData::default();
        host.handle(&ready_from(ORIGIN), &data);
        let reply = host.handle(&ready_from(ORIGIN), &data);
        assert!(matches!(reply, Some(ArtboardMessage::Snapshot { .. })));
    }
}
