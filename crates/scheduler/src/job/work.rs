use crate::error::WorkError;

/// The payload of a [`Job`](super::Job): an operation run exactly once.
///
/// Implementations read inputs and publish outputs through state the producer
/// owns (see [`Slot`](crate::tasks::Slot)). A returned error is logged and
/// counted by the scheduler but does not stop dependents from running; they
/// must inspect that state themselves.
pub trait Work: Send {
    fn run(self: Box<Self>) -> Result<(), WorkError>;
}

impl<F> Work for F
where
    F: FnOnce() -> Result<(), WorkError> + Send,
{
    fn run(self: Box<Self>) -> Result<(), WorkError> {
        (*self)()
    }
}
