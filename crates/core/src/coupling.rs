use crate::{BoxError, DepletionContext};

/// Hooks for an externally coupled program (thermal-hydraulics, fuel
/// performance, and the like).
///
/// Step-boundary and history-complete notifications are delivered as
/// scheduler events; this trait covers the questions the scheduler asks the
/// coupled program and the data-interface refresh around each notification.
/// Every method has a default for the uncoupled case.
pub trait CoupledProgram {
    /// Returns `true` to stop the whole history before the next step.
    fn history_break(&mut self, _context: &DepletionContext) -> bool {
        false
    }

    /// Returns `true` if the current step needs no corrector.
    fn skip_corrector(&mut self, _context: &DepletionContext) -> bool {
        false
    }

    /// Re-reads the values exchanged with the coupled program.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchanged data cannot be read.
    fn refresh_interfaces(&mut self, _context: &DepletionContext) -> Result<(), BoxError> {
        Ok(())
    }
}

/// A run without a coupled program.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncoupled;

impl CoupledProgram for Uncoupled {}
