//! Decode outcome reporting.
//!
//! [`apply_bytes`](crate::CodecRegistry::apply_bytes) never fails as a whole.
//! It returns a [`DecodeReport`] and forwards every [`DecodeFailure`] to the
//! registry's [`DiagnosticsSink`] as it happens.

use parking_lot::Mutex;

use crate::error::DecodeFailure;
use crate::key::MemberKey;

/// Receives per-field decode failures.
pub trait DiagnosticsSink: Send + Sync {
    fn report_error(&self, failure: &DecodeFailure);
}

/// Default sink: writes through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn report_error(&self, failure: &DecodeFailure) {
        log::error!("{}", failure.error);
        match failure.member {
            Some(member) => log::warn!(
                "Failed to deserialize some data from field {}::{member}.",
                failure.owner
            ),
            None => log::warn!("Failed to decode persisted data for {}.", failure.owner),
        }
    }
}

/// Sink that keeps rendered failures in memory, for hosts that surface them
/// in their own UI.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report_error(&self, failure: &DecodeFailure) {
        self.messages.lock().push(failure.to_string());
    }
}

/// Result of applying persisted bytes to an object.
#[derive(Debug, Default)]
pub struct DecodeReport {
    /// Keys whose value was written into a member.
    pub applied: Vec<MemberKey>,
    /// Stored keys the current type does not declare.
    pub skipped: Vec<MemberKey>,
    pub failures: Vec<DecodeFailure>,
}

impl DecodeReport {
    /// `true` when nothing failed. Skipped keys do not count as failures.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of members that failed (deduplicated, in failure order).
    pub fn failed_members(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for name in self.failures.iter().filter_map(|f| f.member) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}
