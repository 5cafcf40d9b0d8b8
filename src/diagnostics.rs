//! Cascading diagnostics.
//!
//! Recursive judgments append the reasons of a failing child before adding
//! their own, so a log always reads from root cause to outermost consequence.
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticLog {
    reasons: Vec<String>,
}

impl DiagnosticLog {
    pub fn new() -> Self { Self::default() }
    pub fn push(&mut self, reason: impl Into<String>) { self.reasons.push(reason.into()); }
    pub fn append(&mut self, other: DiagnosticLog) { self.reasons.extend(other.reasons); }
    pub fn is_empty(&self) -> bool { self.reasons.is_empty() }
    pub fn len(&self) -> usize { self.reasons.len() }
    pub fn reasons(&self) -> &[String] { &self.reasons }
    pub fn into_reasons(self) -> Vec<String> { self.reasons }

    pub fn report_to(&self, sink: &mut dyn DiagnosticSink) {
        for r in &self.reasons { sink.report(r); }
    }
}

impl fmt::Display for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reasons.join("; "))
    }
}

/// Receives reasons one at a time, innermost first.
pub trait DiagnosticSink {
    fn report(&mut self, reason: &str);
}

impl<F: FnMut(&str)> DiagnosticSink for F {
    fn report(&mut self, reason: &str) { self(reason) }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&mut self, reason: &str) { self.push(reason) }
}

/// Outcome of a judgment: whether it holds, and why not if it doesn't.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    holds: bool,
    log: DiagnosticLog,
}

impl Verdict {
    pub(crate) fn new(holds: bool, log: DiagnosticLog) -> Self { Self { holds, log } }
    pub fn holds(&self) -> bool { self.holds }
    pub fn diagnostics(&self) -> &DiagnosticLog { &self.log }
    pub fn into_diagnostics(self) -> DiagnosticLog { self.log }

    /// Forward the diagnostics to `sink` and return the boolean outcome.
    pub fn report_to(self, sink: &mut dyn DiagnosticSink) -> bool {
        self.log.report_to(sink);
        self.holds
    }
}
