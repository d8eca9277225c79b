//! Reference-counted activation gate
//!
//! Counts live observers. Only the 0 → 1 and 1 → 0 crossings matter: they
//! start and stop the sensors.

/// Effect of an acquire/release on the gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateTransition {
    /// First observer arrived
    Opened,
    /// Last observer left
    Closed,
    /// Count changed (or not) without crossing zero
    Unchanged,
}

#[derive(Clone, Debug, Default)]
pub struct ActivationGate {
    observers: usize,
}

impl ActivationGate {
    pub fn new() -> Self {
        ActivationGate { observers: 0 }
    }

    pub fn acquire(&mut self) -> GateTransition {
        self.observers += 1;
        if self.observers == 1 {
            GateTransition::Opened
        } else {
            GateTransition::Unchanged
        }
    }

    /// Releasing a closed gate is a no-op
    pub fn release(&mut self) -> GateTransition {
        match self.observers {
            0 => GateTransition::Unchanged,
            1 => {
                self.observers = 0;
                GateTransition::Closed
            }
            _ => {
                self.observers -= 1;
                GateTransition::Unchanged
            }
        }
    }

    #[inline]
    pub fn observers(&self) -> usize {
        self.observers
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.observers > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_gate_crossings() {
        let mut gate = ActivationGate::new();

        assert_eq!(gate.acquire(), GateTransition::Opened);
        assert_eq!(gate.acquire(), GateTransition::Unchanged);
        assert_eq!(gate.observers(), 2);

        assert_eq!(gate.release(), GateTransition::Unchanged);
        assert_eq!(gate.release(), GateTransition::Closed);
        assert!(!gate.is_open());
    }

    #[test]
    fn test_release_when_closed_is_noop() {
        let mut gate = ActivationGate::new();
        assert_eq!(gate.release(), GateTransition::Unchanged);
        assert_eq!(gate.observers(), 0);

        // Gate still opens normally afterwards
        assert_eq!(gate.acquire(), GateTransition::Opened);
    }

    proptest! {
        #[test]
        fn prop_crossings_track_count(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut gate = ActivationGate::new();
            let mut expected: usize = 0;

            for acquire in ops {
                let before = expected;
                let transition = if acquire {
                    expected += 1;
                    gate.acquire()
                } else {
                    expected = expected.saturating_sub(1);
                    gate.release()
                };

                let crossed_up = before == 0 && expected == 1;
                let crossed_down = before == 1 && expected == 0;
                prop_assert_eq!(transition == GateTransition::Opened, crossed_up);
                prop_assert_eq!(transition == GateTransition::Closed, crossed_down);
                prop_assert_eq!(gate.observers(), expected);
            }
        }
    }
}
