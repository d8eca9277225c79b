//! Platform location service contract
//!
//! The core never talks to sensors directly. A [`LocationService`] wraps the
//! platform mechanism (Android `LocationManager`, gpsd, CoreLocation, ...) and
//! pushes fixes into the stream through an [`UpdateSink`].

use tokio::sync::mpsc;

use geoarb_core::{GeoArbResult, LocationFix, SourceId};

use crate::stream::Command;

/// External collaborator providing sensor access
pub trait LocationService: Send + Sync {
    /// Last fix cached by the platform for `source`, if any
    fn last_known_location(&self, source: SourceId) -> GeoArbResult<Option<LocationFix>>;

    /// Start delivering updates for `source` into `sink`
    ///
    /// Fails with `SubscriptionUnavailable` when the source does not exist on
    /// this device. A failure for one source must not affect the other.
    fn request_updates(&self, source: SourceId, sink: UpdateSink) -> GeoArbResult<()>;

    /// Stop delivering updates for `source`
    ///
    /// Must be idempotent and a no-op for a source that was never subscribed.
    fn remove_updates(&self, source: SourceId);
}

/// Callback handle bound to one source and one activation
///
/// Delivering only enqueues a message, so it is safe to call from any thread,
/// including the platform's own sensor threads.
#[derive(Clone, Debug)]
pub struct UpdateSink {
    source: SourceId,
    activation: u64,
    commands: mpsc::UnboundedSender<Command>,
}

impl UpdateSink {
    pub(crate) fn new(
        source: SourceId,
        activation: u64,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        UpdateSink {
            source,
            activation,
            commands,
        }
    }

    #[inline]
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Push a new fix, returns false once the stream has shut down
    pub fn deliver(&self, fix: LocationFix) -> bool {
        self.commands
            .send(Command::Update {
                source: self.source,
                activation: self.activation,
                fix,
            })
            .is_ok()
    }

    /// True while the processing task is still alive
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }
}
