use log::{debug, info, warn};

use crate::prelude::StageError;

/// Stage-scoped wrapper over the `log` facade.
pub struct LogManager {
    stage: &'static str,
}

impl LogManager {
    pub fn new(stage: &'static str) -> Self {
        Self { stage }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn record(&self, message: &str) {
        info!("{}: {}", self.stage, message);
    }

    pub fn detail(&self, message: &str) {
        debug!("{}: {}", self.stage, message);
    }

    pub fn failure(&self, error: &StageError) {
        warn!("{} failed ({}): {}", self.stage, error.kind(), error);
    }
}
