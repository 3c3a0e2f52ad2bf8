use crate::processing::dispatch::ChosenPath;
use serde::Serialize;
use std::sync::Mutex;

/// Per-path evaluation counters shared across a run.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Default)]
struct Metrics {
    type1: usize,
    type3: usize,
    direct: usize,
    errors: usize,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub type1: usize,
    pub type3: usize,
    pub direct: usize,
    pub errors: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_path(&self, path: ChosenPath) {
        if let Ok(mut metrics) = self.inner.lock() {
            match path {
                ChosenPath::Type1 => metrics.type1 += 1,
                ChosenPath::Type3 => metrics.type3 += 1,
                ChosenPath::Direct => metrics.direct += 1,
            }
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                type1: metrics.type1,
                type3: metrics.type3,
                direct: metrics.direct,
                errors: metrics.errors,
            }
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
