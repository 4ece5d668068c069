/// Which half of a predictor–corrector step is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Beginning-of-step transport and depletion with beginning-of-step rates.
    #[default]
    Predictor,
    /// End-of-step transport and depletion with averaged rates.
    Corrector,
}

/// Position of a depletion run in its burnup history.
///
/// The scheduler owns one context per worker and passes it explicitly to
/// every operation; there is no ambient scheduling state. Counters only move
/// forward, and every worker moves them identically, so contexts agree
/// across workers without being shared.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepletionContext {
    /// Index of the current burnup interval.
    pub interval: usize,
    /// Step index within the current interval.
    pub step: usize,
    /// Steps completed over the whole history.
    pub global_step: usize,
    pub phase: Phase,
    /// Corrector iteration within the current step (self-iterating mode).
    pub corrector_iteration: usize,
    /// Cumulative burnup (MWd/kgHM).
    pub burnup: f64,
    /// Cumulative energy released (MWd).
    pub energy: f64,
    /// Cumulative burn time (s).
    pub burn_time: f64,
    notified: bool,
}

impl DepletionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to the first step of interval `interval`.
    pub fn begin_interval(&mut self, interval: usize) {
        self.interval = interval;
        self.step = 0;
    }

    /// Resets the per-step state before the predictor runs.
    pub fn begin_step(&mut self) {
        self.phase = Phase::Predictor;
        self.corrector_iteration = 0;
        self.notified = false;
    }

    pub fn enter_corrector(&mut self) {
        self.phase = Phase::Corrector;
    }

    /// Marks the step-boundary notification as sent.
    ///
    /// Returns `true` the first time it is called in a step, so callers
    /// notify at most once per step.
    pub fn mark_notified(&mut self) -> bool {
        !std::mem::replace(&mut self.notified, true)
    }

    #[must_use]
    pub fn notified(&self) -> bool {
        self.notified
    }

    /// Records a completed step and advances the step counters.
    pub fn advance(&mut self, burnup: f64, energy: f64, dt: f64) {
        self.burnup += burnup;
        self.energy += energy;
        self.burn_time += dt;
        self.step += 1;
        self.global_step += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_is_marked_once_per_step() {
        let mut ctx = DepletionContext::new();
        ctx.begin_step();
        assert!(ctx.mark_notified());
        assert!(!ctx.mark_notified());

        ctx.begin_step();
        assert!(!ctx.notified());
        assert!(ctx.mark_notified());
    }

    #[test]
    fn advance_accumulates_and_counts() {
        let mut ctx = DepletionContext::new();
        ctx.begin_interval(1);
        ctx.advance(1.5, 10.0, 86_400.0);
        ctx.advance(0.5, 5.0, 86_400.0);

        assert_eq!(ctx.interval, 1);
        assert_eq!(ctx.step, 2);
        assert_eq!(ctx.global_step, 2);
        assert_eq!(ctx.burnup, 2.0);
        assert_eq!(ctx.burn_time, 172_800.0);

        ctx.begin_interval(2);
        assert_eq!(ctx.step, 0);
        assert_eq!(ctx.global_step, 2);
    }
}
