//! Dashboard session lifecycle

use crate::{IntegrationError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// Transitions kept in the history; older entries are dropped
const MAX_HISTORY: usize = 32;

/// Lifecycle states of one dashboard view
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LifecycleState {
    Created,
    Mounted,
    Unmounted,
}

/// Lifecycle statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LifecycleStats {
    pub state_transitions: u64,
    pub mounts: u64,
    pub unmounts: u64,
}

/// Tracks mount/unmount transitions for a dashboard session
#[derive(Clone)]
pub struct LifecycleCoordinator {
    state: Arc<RwLock<LifecycleState>>,
    state_history: Arc<RwLock<Vec<(Instant, LifecycleState)>>>,
    stats: Arc<RwLock<LifecycleStats>>,
}

impl Default for LifecycleCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleCoordinator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LifecycleState::Created)),
            state_history: Arc::new(RwLock::new(vec![(Instant::now(), LifecycleState::Created)])),
            stats: Arc::new(RwLock::new(LifecycleStats::default())),
        }
    }

    pub fn get_state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub fn is_mounted(&self) -> bool {
        self.get_state() == LifecycleState::Mounted
    }

    /// Transition to a new state
    pub fn transition_to(&self, new_state: LifecycleState) -> Result<()> {
        {
            let mut state = self.state.write();
            let old = *state;

            if !Self::is_valid_transition(old, new_state) {
                return Err(IntegrationError::Lifecycle(format!(
                    "Invalid transition from {:?} to {:?}",
                    old, new_state
                )));
            }

            *state = new_state;
        }

        {
            let mut history = self.state_history.write();
            history.push((Instant::now(), new_state));
            if history.len() > MAX_HISTORY {
                history.remove(0);
            }
        }

        let mut stats = self.stats.write();
        stats.state_transitions += 1;
        match new_state {
            LifecycleState::Mounted => stats.mounts += 1,
            LifecycleState::Unmounted => stats.unmounts += 1,
            LifecycleState::Created => {}
        }

        Ok(())
    }

    pub fn mount(&self) -> Result<()> {
        self.transition_to(LifecycleState::Mounted)?;
        log::info!("Dashboard mounted");
        Ok(())
    }

    pub fn unmount(&self) -> Result<()> {
        self.transition_to(LifecycleState::Unmounted)?;
        log::info!("Dashboard unmounted");
        Ok(())
    }

    /// Most recent states visited, oldest first
    pub fn history(&self) -> Vec<LifecycleState> {
        self.state_history.read().iter().map(|(_, s)| *s).collect()
    }

    pub fn get_stats(&self) -> LifecycleStats {
        self.stats.read().clone()
    }

    fn is_valid_transition(from: LifecycleState, to: LifecycleState) -> bool {
        use LifecycleState::*;

        matches!(
            (from, to),
            (Created, Mounted) | (Mounted, Unmounted) | (Unmounted, Mounted)
        )
    }
}
