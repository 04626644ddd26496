/// Conditions reported to the fault handler of a [`Ds248x`](crate::Ds248x).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The bridge detected a short on the 1-Wire line.
    ShortCircuit,
    /// The bridge reports it went through an internal reset (power-on or device reset)
    /// and lost its configuration.
    DeviceReset,
    /// The bridge stayed busy past the retry budget and needs a device reset.
    BusyTimeout,
}

/// Remembers the last observed level of a condition.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Edge(bool);

impl Edge {
    /// Records `level` and returns `true` only on a low to high transition.
    pub(crate) fn rising(&mut self, level: bool) -> bool {
        let rose = level && !self.0;
        self.0 = level;
        rose
    }
}

/// Edge memory for the conditions that are reported once per assertion.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FaultLatch {
    pub(crate) short: Edge,
    pub(crate) reset: Edge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_fires_once_per_assertion() {
        let mut edge = Edge::default();
        assert!(edge.rising(true));
        assert!(!edge.rising(true));
        assert!(!edge.rising(true));
        assert!(!edge.rising(false));
        assert!(edge.rising(true));
    }
}
