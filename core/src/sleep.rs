//! Pause between polls.
use std::time::Duration;

/// Suspends the caller between transport polls.
pub trait Sleep {
    /// Pause for `duration`.
    fn sleep(&mut self, duration: Duration);
}

impl<S: Sleep + ?Sized> Sleep for &mut S {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
