//! Shared online/offline signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Connectivity flag shared between the host and the orchestrator.
///
/// Clones observe the same value. The host flips it when the environment
/// reports a change; the orchestrator only reads it.
#[derive(Debug, Clone)]
pub struct Connectivity {
    online: Arc<AtomicBool>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self { online: Arc::new(AtomicBool::new(online)) }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Record a new state. Returns the previous one.
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::AcqRel)
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
