/// Control actions supported by the depletion scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the history at the next step boundary.
    ///
    /// Activities and the checkpoint are flushed before the run returns.
    Break,
}
