// src/notify.rs

//! Toasts and sound cues.
//!
//! A single toast is shown at a time. Every `show` hands out a fresh ticket
//! and the expiry timer carries that ticket, so a timer left over from an
//! older toast cannot clear a newer one.

use std::time::Duration;

use serde::Serialize;

pub use crate::models::VisitSignal;

/// Identifies one shown toast.
pub type Ticket = u64;

/// Transient status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub message: String,
    #[serde(skip)]
    pub ticket: Ticket,
}

/// Last-call-wins toast slot.
#[derive(Debug, Default)]
pub struct Toaster {
    current: Option<Toast>,
    issued: Ticket,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current toast. Returns the ticket to expire it with.
    pub fn show(&mut self, message: impl Into<String>) -> Ticket {
        self.issued += 1;
        self.current = Some(Toast {
            message: message.into(),
            ticket: self.issued,
        });
        self.issued
    }

    /// Clear the toast if `ticket` is still the one on screen.
    pub fn expire(&mut self, ticket: Ticket) -> bool {
        if self.current.as_ref().is_some_and(|t| t.ticket == ticket) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }
}

/// Short audio effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    PageLoad,
    /// Single tone at the given frequency
    Ping(u32),
    Achievement,
}

impl Cue {
    pub const VISIT_HZ: u32 = 520;
    pub const MILESTONE_HZ: u32 = 880;

    /// Playback length.
    pub fn length(self) -> Duration {
        match self {
            Self::PageLoad => Duration::from_millis(400),
            Self::Ping(_) => Duration::from_millis(150),
            Self::Achievement => Duration::from_millis(600),
        }
    }
}

/// Plays cues. Implementations must not block.
pub trait Speaker: Send {
    fn play(&mut self, cue: Cue);
}

/// Speaker that writes cues to the log.
#[derive(Debug, Default)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn play(&mut self, cue: Cue) {
        log::debug!("Sound cue {:?} ({} ms)", cue, cue.length().as_millis());
    }
}

/// Speaker that keeps every cue, for inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingSpeaker {
    played: std::sync::Arc<std::sync::Mutex<Vec<Cue>>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Cue> {
        self.played
            .lock()
            .map(|cues| cues.clone())
            .unwrap_or_default()
    }
}

impl Speaker for RecordingSpeaker {
    fn play(&mut self, cue: Cue) {
        if let Ok(mut cues) = self.played.lock() {
            cues.push(cue);
        }
    }
}

pub fn visit_message(place: &str, visited: bool) -> String {
    if visited {
        format!("Marked {} as visited", place)
    } else {
        format!("Removed {} from visited", place)
    }
}

pub fn milestone_message(count: u32) -> String {
    format!("Achievement unlocked: {} places visited!", count)
}
