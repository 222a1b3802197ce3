//! Task and timer shims.
//!
//! Native targets run on the ambient Tokio runtime; `wasm32` runs on the
//! browser event loop via `wasm-bindgen-futures` and `gloo-timers`.

use futures::future::{AbortHandle, Abortable};
use std::future::Future;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(future);
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn spawn<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
pub(crate) async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await;
}

/// Runs `tick` every `period` until the returned handle is aborted.
///
/// The first call happens one full period after spawning.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn spawn_ticker<F>(period: Duration, mut tick: F) -> AbortHandle
where
    F: FnMut() + Send + 'static,
{
    let (handle, registration) = AbortHandle::new_pair();
    let task = async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tick();
        }
    };
    spawn(async move {
        let _ = Abortable::new(task, registration).await;
    });
    handle
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn spawn_ticker<F>(period: Duration, mut tick: F) -> AbortHandle
where
    F: FnMut() + 'static,
{
    let (handle, registration) = AbortHandle::new_pair();
    let task = async move {
        loop {
            sleep(period).await;
            tick();
        }
    };
    spawn(async move {
        let _ = Abortable::new(task, registration).await;
    });
    handle
}
