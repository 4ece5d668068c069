use burnup_core::{DepletionContext, StepType};

use crate::merge::MergeReport;

use super::StepRecord;

/// Event emitted by the scheduler as the history advances.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An interval begins; `steps` counts the extra final step, if any.
    IntervalStarted {
        context: DepletionContext,
        step_type: StepType,
        steps: usize,
    },

    /// A transport solve finished and its tallies were reduced.
    TransportSolved {
        context: DepletionContext,
        /// Total power (W).
        power: f64,
    },

    /// The coupled program may exchange data; sent at most once per step.
    StepBoundary { context: DepletionContext },

    /// Another self-iterating corrector pass follows.
    CorrectorRepeated {
        context: DepletionContext,
        /// Largest relative density change of the last pass.
        change: f64,
    },

    /// Every worker now holds the same compositions.
    Merged {
        context: DepletionContext,
        report: MergeReport,
    },

    /// A step finished and the counters advanced.
    StepCompleted {
        context: DepletionContext,
        record: StepRecord,
    },

    /// The history ended, normally or by a break.
    HistoryComplete { context: DepletionContext },
}

impl Event {
    /// The scheduler position when the event was emitted.
    #[must_use]
    pub fn context(&self) -> &DepletionContext {
        match self {
            Self::IntervalStarted { context, .. }
            | Self::TransportSolved { context, .. }
            | Self::StepBoundary { context }
            | Self::CorrectorRepeated { context, .. }
            | Self::Merged { context, .. }
            | Self::StepCompleted { context, .. }
            | Self::HistoryComplete { context } => context,
        }
    }
}
