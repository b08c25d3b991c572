//! Wall clock and timer used by the trust window and the verification race.
//!
//! Hydrate builds read `Date.now()` and sleep on `gloo-timers`. Native builds
//! read `SystemTime` and have no timer: their sleep resolves immediately, so a
//! server render never waits on a verification race it cannot win.

use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Future resolving after `duration`.
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Platform clock for the current build target.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        #[cfg(feature = "hydrate")]
        {
            #[allow(clippy::cast_possible_truncation)]
            let now = js_sys::Date::now() as i64;
            now
        }
        #[cfg(not(feature = "hydrate"))]
        {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        }
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        #[cfg(feature = "hydrate")]
        {
            gloo_timers::future::sleep(duration).boxed_local()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = duration;
            futures::future::ready(()).boxed_local()
        }
    }
}
