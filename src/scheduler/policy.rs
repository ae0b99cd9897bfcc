//! CheckpointPolicy trait.

/// Decides where the checkpoints are and what happens when one is reached.
///
/// The scheduler owns the policy behind a mutex and calls these hooks from
/// its worker thread. A checkpoint is a media time in seconds.
pub trait CheckpointPolicy: Send + 'static {
    /// Select the next checkpoint strictly after `current_time`.
    fn select_next(&mut self, current_time: f64);

    /// Clear the pending checkpoint.
    ///
    /// Afterwards [`checkpoint`](Self::checkpoint) must return `None`.
    /// Called after [`on_reached`](Self::on_reached), whether it succeeded or not.
    fn reset(&mut self);

    /// The pending checkpoint, `None` if there is none.
    ///
    /// Called on every wake cycle, so it must be cheap. The value may only
    /// change through `select_next` or `reset`.
    fn checkpoint(&self) -> Option<f64>;

    /// The pending checkpoint was reached.
    fn on_reached(&mut self) -> anyhow::Result<()>;
}
