//! Pluggable diagnostic reporting.
//!
//! Analyses and the loader emit `Proof` and diagnostic `Message` records
//! instead of writing to a fixed sink, so a GUI, a CLI, or a test harness can
//! format them however it likes (spec §7's "pluggable reporter").

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic or analysis Proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Severity {
    None,
    Low,
    Mid,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Mid => "mid",
            Severity::High => "high",
        };
        f.write_str(s)
    }
}

/// Kind of a Proof record, naming which clause of an analysis's rule fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ProofKind {
    /// A required rule, role, or user is missing.
    Missing,
    /// The object satisfied a positive-evidence clause.
    Satisfied,
    /// The module ran with reduced information.
    Diagnostic,
}

/// An auditable justification record attached to an analysis `Item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Proof {
    pub kind: ProofKind,
    pub text: String,
    pub severity: Severity,
}

impl Proof {
    pub fn new(kind: ProofKind, text: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind,
            text: text.into(),
            severity,
        }
    }

    pub fn missing(text: impl Into<String>) -> Self {
        Self::new(ProofKind::Missing, text, Severity::High)
    }

    pub fn satisfied(text: impl Into<String>) -> Self {
        Self::new(ProofKind::Satisfied, text, Severity::None)
    }

    pub fn diagnostic(text: impl Into<String>) -> Self {
        Self::new(ProofKind::Diagnostic, text, Severity::Low)
    }
}

/// A user-visible message passed through the reporter (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub module: &'static str,
    pub text: String,
}

/// Pluggable sink for `Message`s emitted while loading, querying, diffing,
/// or analyzing a policy.
///
/// Implementors decide how to format and where to send messages; the core
/// never writes to a fixed stream itself.
pub trait Reporter {
    fn report(&mut self, message: Message);
}

/// In-memory `Reporter` that simply collects every message, in emission
/// order. The default choice for tests and for callers that want to inspect
/// diagnostics programmatically rather than print them.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    messages: Vec<Message>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// `Reporter` that forwards every message to `tracing` at a level derived
/// from its severity. Used by `policy-cli`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, message: Message) {
        match message.severity {
            Severity::None | Severity::Low => {
                tracing::debug!(module = message.module, "{}", message.text)
            }
            Severity::Mid => tracing::warn!(module = message.module, "{}", message.text),
            Severity::High => tracing::error!(module = message.module, "{}", message.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_reporter_preserves_order() {
        let mut reporter = CollectingReporter::new();
        reporter.report(Message {
            severity: Severity::Low,
            module: "a",
            text: "first".into(),
        });
        reporter.report(Message {
            severity: Severity::High,
            module: "b",
            text: "second".into(),
        });
        let messages = reporter.into_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "first");
        assert_eq!(messages[1].text, "second");
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::None < Severity::Low);
        assert!(Severity::Low < Severity::Mid);
        assert!(Severity::Mid < Severity::High);
    }
}
