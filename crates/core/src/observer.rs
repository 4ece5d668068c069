/// Watches a depletion history as it runs.
///
/// The scheduler hands every event (interval start, transport solve, merge,
/// step boundary, step completion) to its observer. Returning `Some(action)`
/// steers the history, e.g. a history break at the next step boundary;
/// `None` leaves it alone.
///
/// Any `FnMut(&E) -> Option<A>` closure is an observer, and `()` ignores
/// every event.
pub trait Observer<E, A> {
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
