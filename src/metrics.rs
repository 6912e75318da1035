// src/metrics.rs

//! Selection and failure counters, recorded through the `metrics` facade.
//!
//! No exporter is installed here; the embedding application decides where the
//! counters go. Without the `metrics` feature every call is a no-op.

/// Which branch of the selector produced a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPath {
    /// Single unregistered key, or a provider with one key, returned as given.
    Passthrough,
    Single,
    Multi,
    /// Every key of the provider is cooling down; the input key is returned.
    LivenessFallback,
    /// Selection failed internally and fell back to an unfiltered pick.
    ErrorFallback,
}

impl SelectionPath {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Single => "single",
            Self::Multi => "multi",
            Self::LivenessFallback => "liveness_fallback",
            Self::ErrorFallback => "error_fallback",
        }
    }
}

#[cfg(feature = "metrics")]
mod recorder {
    use super::SelectionPath;
    use metrics::{counter, Counter};
    use once_cell::sync::Lazy;

    struct SelectionCounters {
        passthrough: Counter,
        single: Counter,
        multi: Counter,
        liveness_fallback: Counter,
        error_fallback: Counter,
    }

    static SELECTIONS: Lazy<SelectionCounters> = Lazy::new(|| {
        let path = |p: SelectionPath| counter!("search_keys_selections_total", "path" => p.as_str());
        SelectionCounters {
            passthrough: path(SelectionPath::Passthrough),
            single: path(SelectionPath::Single),
            multi: path(SelectionPath::Multi),
            liveness_fallback: path(SelectionPath::LivenessFallback),
            error_fallback: path(SelectionPath::ErrorFallback),
        }
    });

    pub fn record_selection(path: SelectionPath) {
        let counters = &*SELECTIONS;
        let counter = match path {
            SelectionPath::Passthrough => &counters.passthrough,
            SelectionPath::Single => &counters.single,
            SelectionPath::Multi => &counters.multi,
            SelectionPath::LivenessFallback => &counters.liveness_fallback,
            SelectionPath::ErrorFallback => &counters.error_fallback,
        };
        counter.increment(1);
    }

    pub fn record_failure_report(provider: &str) {
        counter!("search_keys_failures_reported_total", "provider" => provider.to_string())
            .increment(1);
    }
}

#[cfg(feature = "metrics")]
pub use recorder::{record_failure_report, record_selection};

#[cfg(not(feature = "metrics"))]
pub fn record_selection(_path: SelectionPath) {}

#[cfg(not(feature = "metrics"))]
pub fn record_failure_report(_provider: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_labels() {
        assert_eq!(SelectionPath::Passthrough.as_str(), "passthrough");
        assert_eq!(SelectionPath::LivenessFallback.as_str(), "liveness_fallback");
        assert_eq!(SelectionPath::ErrorFallback.as_str(), "error_fallback");
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        record_selection(SelectionPath::Multi);
        record_failure_report("brave");
    }
}
