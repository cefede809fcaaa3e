//! Canned prediction provider.

use std::sync::Arc;

use parking_lot::Mutex;
use scr_driver::{PredictionError, PredictionProvider, ProviderLoader};

/// Returns the same outputs on every call and remembers the features it saw.
#[derive(Debug, Clone)]
pub struct FixedPredictionProvider {
    outputs: Result<Vec<f64>, PredictionError>,
    seen: Arc<Mutex<Vec<Vec<f64>>>>,
}

impl FixedPredictionProvider {
    pub fn new(outputs: Vec<f64>) -> Self {
        Self {
            outputs: Ok(outputs),
            seen: Arc::default(),
        }
    }

    /// Provider whose every prediction fails.
    pub fn failing(reason: &str) -> Self {
        Self {
            outputs: Err(PredictionError::Failed(reason.to_string())),
            seen: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn seen_features(&self) -> Vec<Vec<f64>> {
        self.seen.lock().clone()
    }

    /// Loader handing out clones of this provider.
    pub fn loader(&self) -> Box<dyn ProviderLoader> {
        let provider = self.clone();
        Box::new(move || -> Result<Box<dyn PredictionProvider>, PredictionError> {
            Ok(Box::new(provider.clone()))
        })
    }

    /// Loader that always fails with `reason`.
    pub fn failing_loader(reason: &str) -> Box<dyn ProviderLoader> {
        let reason = reason.to_string();
        Box::new(move || -> Result<Box<dyn PredictionProvider>, PredictionError> {
            Err(PredictionError::Unavailable(reason.clone()))
        })
    }
}

impl PredictionProvider for FixedPredictionProvider {
    fn predict(&mut self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        self.seen.lock().push(features.to_vec());
        self.outputs.clone()
    }
}
