//! Wall clock and sleeping, behind a trait so the monitor loop can run
//! against simulated time.

use core::future::Future;
use core::time::Duration;

use chrono::{DateTime, Local};

/// Source of the current local time and of delays.
pub trait Clock: core::fmt::Debug + Send + Sync {
    /// Returns the current local wall-clock time.
    fn now(&self) -> DateTime<Local>;

    /// Completes after `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// [`Clock`] backed by the system time and the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    #[inline]
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
