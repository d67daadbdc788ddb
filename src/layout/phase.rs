use std::fmt;

/// Monotonically increasing id stamped on every outstanding measurement or layout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub(crate) u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPhase {
    Init,
    MeasuringSizes,
    AwaitingLayout,
    Done,
    Cancelled,
    Failed,
}

impl LayoutPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, LayoutPhase::Done | LayoutPhase::Cancelled | LayoutPhase::Failed)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, LayoutPhase::MeasuringSizes | LayoutPhase::AwaitingLayout)
    }

    /// Forward transitions only; `Cancelled` is reachable from the two waiting phases.
    pub fn can_advance_to(self, next: LayoutPhase) -> bool {
        use LayoutPhase::*;
        matches!(
            (self, next),
            (Init, MeasuringSizes)
                | (MeasuringSizes, AwaitingLayout)
                | (AwaitingLayout, Done)
                | (MeasuringSizes, Cancelled)
                | (AwaitingLayout, Cancelled)
                | (MeasuringSizes, Failed)
                | (AwaitingLayout, Failed)
        )
    }
}

impl fmt::Display for LayoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutPhase::Init => "init",
            LayoutPhase::MeasuringSizes => "measuring-sizes",
            LayoutPhase::AwaitingLayout => "awaiting-layout",
            LayoutPhase::Done => "done",
            LayoutPhase::Cancelled => "cancelled",
            LayoutPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_only_move_forward() {
        use LayoutPhase::*;
        assert!(Init.can_advance_to(MeasuringSizes));
        assert!(MeasuringSizes.can_advance_to(AwaitingLayout));
        assert!(AwaitingLayout.can_advance_to(Done));
        assert!(!Init.can_advance_to(AwaitingLayout));
        assert!(!MeasuringSizes.can_advance_to(Done));
        assert!(!Done.can_advance_to(Cancelled));
        assert!(!Init.can_advance_to(Cancelled));
        assert!(AwaitingLayout.can_advance_to(Cancelled));
    }
}
