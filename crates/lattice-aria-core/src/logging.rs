//! Logging facilities for Lattice ARIA.
//!
//! Lattice ARIA uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("lattice_aria=debug")
//!     .init();
//! ```
//!
//! State transitions (listbox opened/closed, item accepted, dialog toggled)
//! are logged at `debug`; store and signal traffic at `trace`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "lattice_aria_core";
    /// Signal/slot target.
    pub const SIGNAL: &str = "lattice_aria_core::signal";
    /// Store target.
    pub const STORE: &str = "lattice_aria_core::store";
    /// Combobox behavior target.
    pub const COMBOBOX: &str = "lattice_aria::combobox";
    /// Dialog behavior target.
    pub const DIALOG: &str = "lattice_aria::dialog";
    /// Floating helper target.
    pub const FLOATING: &str = "lattice_aria::floating";
    /// Document and event dispatch target.
    pub const DOM: &str = "lattice_aria::dom";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing event handlers under a profiler.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::trace_span!(target: "lattice_aria::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }

    #[test]
    fn test_targets_are_namespaced() {
        for target in [targets::SIGNAL, targets::STORE] {
            assert!(target.starts_with(targets::CORE));
        }
        assert!(targets::COMBOBOX.starts_with("lattice_aria::"));
    }
}
