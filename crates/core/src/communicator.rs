/// Collective operations between cooperating workers.
///
/// Every worker must make the same sequence of collective calls. Each call
/// blocks until all workers have reached it, so these calls are the only
/// points where ownership boundaries are crossed.
pub trait Communicator {
    /// This worker's rank in `0..size`.
    fn rank(&self) -> usize;

    /// Number of cooperating workers.
    fn size(&self) -> usize;

    /// Blocks until every worker reaches the barrier.
    fn barrier(&self);

    /// Replaces `values` with the element-wise sum over all workers.
    ///
    /// Implementations must add contributions in rank order so the result
    /// is bit-identical on every worker.
    fn sum_reduce(&self, values: &mut [f64]);

    /// Replaces `values` on every worker with the values held by `root`.
    fn broadcast(&self, root: usize, values: &mut Vec<f64>);

    /// Tells every peer that this worker hit a fatal error.
    ///
    /// Peers blocked in, or later entering, a collective call must not wait
    /// for this worker again. The default does nothing.
    fn abort(&self) {}
}

/// The communicator of a single-worker run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloCommunicator;

impl Communicator for SoloCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn sum_reduce(&self, _values: &mut [f64]) {}

    fn broadcast(&self, _root: usize, _values: &mut Vec<f64>) {}
}
