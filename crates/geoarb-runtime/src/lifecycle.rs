//! Sensor lifecycle management
//!
//! Two states only. Activating subscribes both sources, each one failing on
//! its own; deactivating removes both unconditionally. Repeating a transition
//! in the state it leads to does nothing.

use geoarb_core::SourceId;

use crate::{LocationService, UpdateSink};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Inactive,
    Active,
}

/// Starts and stops the two sensor subscriptions
#[derive(Debug)]
pub struct SensorLifecycleManager {
    state: LifecycleState,
    /// Which sources subscribed successfully in the current activation
    subscribed: [bool; 2],
    /// Number of activations so far, identifies the current one
    activation: u64,
}

impl SensorLifecycleManager {
    pub fn new() -> Self {
        SensorLifecycleManager {
            state: LifecycleState::Inactive,
            subscribed: [false; 2],
            activation: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    /// Identifier of the current (or last) activation
    #[inline]
    pub fn activation(&self) -> u64 {
        self.activation
    }

    /// True if `source` subscribed successfully in the current activation
    #[inline]
    pub fn subscribed(&self, source: SourceId) -> bool {
        self.subscribed[source.index()]
    }

    /// Inactive → Active: subscribe both sources
    ///
    /// `sink_for` builds the callback handle for a source and activation id.
    /// Returns false if already active.
    pub fn activate<F>(&mut self, service: &dyn LocationService, mut sink_for: F) -> bool
    where
        F: FnMut(SourceId, u64) -> UpdateSink,
    {
        if self.is_active() {
            return false;
        }

        self.activation += 1;
        self.state = LifecycleState::Active;
        tracing::debug!(activation = self.activation, "Starting the GPS and network listeners");

        for source in SourceId::ALL {
            let sink = sink_for(source, self.activation);
            match service.request_updates(source, sink) {
                Ok(()) => self.subscribed[source.index()] = true,
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "There is no location provider");
                    self.subscribed[source.index()] = false;
                }
            }
        }

        true
    }

    /// Active → Inactive: remove both sources
    ///
    /// Returns false if already inactive.
    pub fn deactivate(&mut self, service: &dyn LocationService) -> bool {
        if !self.is_active() {
            return false;
        }

        tracing::debug!(activation = self.activation, "Stopping the GPS and network listeners");
        for source in SourceId::ALL {
            service.remove_updates(source);
        }

        self.subscribed = [false; 2];
        self.state = LifecycleState::Inactive;
        true
    }
}

impl Default for SensorLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
