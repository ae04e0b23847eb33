//! Training progress events and their sinks

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Something worth reporting while a run progresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainingEvent {
    SearchStarted {
        candidate: String,
        n_combinations: usize,
    },
    BestParams {
        candidate: String,
        params: String,
        cv_score: f64,
    },
    CandidateSkipped {
        candidate: String,
        reason: String,
    },
    Evaluated {
        candidate: String,
        test_r2: f64,
    },
    WinnerSelected {
        candidate: String,
        test_r2: f64,
    },
    GateFailed {
        candidate: String,
        test_r2: f64,
        threshold: f64,
    },
    ModelSaved {
        path: PathBuf,
    },
}

/// Receives every `TrainingEvent` of a run
pub trait TrainingObserver: Send + Sync {
    fn on_event(&self, event: &TrainingEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TrainingObserver for TracingObserver {
    fn on_event(&self, event: &TrainingEvent) {
        match event {
            TrainingEvent::SearchStarted {
                candidate,
                n_combinations,
            } => info!(candidate = %candidate, n_combinations, "Starting grid search"),
            TrainingEvent::BestParams {
                candidate,
                params,
                cv_score,
            } => info!(candidate = %candidate, params = %params, cv_r2 = cv_score, "Best parameters"),
            TrainingEvent::CandidateSkipped { candidate, reason } => {
                warn!(candidate = %candidate, reason = %reason, "Candidate skipped")
            }
            TrainingEvent::Evaluated { candidate, test_r2 } => {
                info!(candidate = %candidate, test_r2, "Evaluated on test set")
            }
            TrainingEvent::WinnerSelected { candidate, test_r2 } => {
                info!(candidate = %candidate, test_r2, "Best model selected")
            }
            TrainingEvent::GateFailed {
                candidate,
                test_r2,
                threshold,
            } => warn!(candidate = %candidate, test_r2, threshold, "Best model below quality threshold"),
            TrainingEvent::ModelSaved { path } => {
                info!(path = %path.display(), "Model saved")
            }
        }
    }
}

/// Keeps every event in memory, for inspection after a run
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TrainingEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrainingEvent> {
        self.events.lock().clone()
    }
}

impl TrainingObserver for RecordingObserver {
    fn on_event(&self, event: &TrainingEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&TrainingEvent::Evaluated {
            candidate: "Ridge".to_string(),
            test_r2: 0.8,
        });
        observer.on_event(&TrainingEvent::WinnerSelected {
            candidate: "Ridge".to_string(),
            test_r2: 0.8,
        });
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], TrainingEvent::WinnerSelected { .. }));
    }

    #[test]
    fn test_tracing_observer_accepts_all_events() {
        let observer = TracingObserver;
        observer.on_event(&TrainingEvent::ModelSaved {
            path: PathBuf::from("artifacts/model.bin"),
        });
        observer.on_event(&TrainingEvent::CandidateSkipped {
            candidate: "Lasso".to_string(),
            reason: "diverged".to_string(),
        });
    }
}
