use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::error::ContainerError;

/// Composition state. Transitions once, from `Open` to `Frozen`, on the first
/// resolution request or the first verification (successful or not).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionState {
    Open,
    Frozen,
}

/// State machine guarding every mutation of the composition.
///
/// Callers check and transition while holding the registry write lock, so a
/// mutation either lands before the freeze or fails.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    frozen: AtomicBool,
}

impl Lifecycle {
    pub fn state(&self) -> CompositionState {
        if self.frozen.load(Ordering::Acquire) {
            CompositionState::Frozen
        } else {
            CompositionState::Open
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.state() == CompositionState::Frozen
    }

    pub fn ensure_open(&self, operation: &'static str) -> Result<(), ContainerError> {
        match self.state() {
            CompositionState::Open => Ok(()),
            CompositionState::Frozen => {
                tracing::warn!(operation, "rejected mutation of a frozen container");
                Err(ContainerError::Locked { operation })
            }
        }
    }

    /// Returns `true` if this call performed the transition.
    pub fn freeze(&self) -> bool {
        !self.frozen.swap(true, Ordering::AcqRel)
    }
}
