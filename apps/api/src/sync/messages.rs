#![allow(dead_code)]

//! Wire schema for the host ↔ artboard channel.
//!
//! Messages are externally tagged by a `type` field in SCREAMING_CASE and
//! travel inside an envelope carrying the sender origin. The document push
//! is always a full snapshot; there are no deltas on this channel.

use serde::{Deserialize, Serialize};

use crate::document::ResumeData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArtboardMessage {
    /// Artboard → host: the artboard frame finished booting and can accept
    /// document pushes.
    #[serde(rename = "READY")]
    Ready,

    /// Host → artboard: full document snapshot. Last write wins.
    #[serde(rename = "DOCUMENT_SNAPSHOT")]
    Snapshot { payload: Box<ResumeData> },

    #[serde(rename = "ZOOM_IN")]
    ZoomIn,

    #[serde(rename = "ZOOM_OUT")]
    ZoomOut,

    #[serde(rename = "CENTER_VIEW")]
    CenterView,

    #[serde(rename = "RESET_VIEW")]
    ResetView,

    #[serde(rename = "SET_PAN_MODE")]
    SetPanMode {
        #[serde(rename = "panMode")]
        pan_mode: bool,
    },
}

/// A message plus the origin it arrived from. Receivers drop envelopes whose
/// origin is not the one they were configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: String,
    #[serde(flatten)]
    pub message: ArtboardMessage,
}

impl Envelope {
    pub fn new(origin: impl Into<String>, message: ArtboardMessage) -> Self {
        Envelope {
            origin: origin.into(),
            message,
        }
    }
}
