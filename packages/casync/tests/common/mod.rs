#![allow(dead_code)]

use std::time::Duration;

use casync::{Callback, Next};
use tokio::sync::oneshot;

pub type Completion<V> = (Option<casync::Error>, Option<V>);

/// Stand-in for a callback-based timer: call the continuation after `ms`
pub fn timeout_set<V: 'static>(ms: u64, next: Next<V>) {
    tokio::task::spawn_local(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        if let Err(e) = next.unit() {
            casync::error!("timer could not resume coroutine: {e}");
        }
    });
}

/// Like `timeout_set`, but inject an error
pub fn timeout_fail<V: 'static>(ms: u64, next: Next<V>, msg: &'static str) {
    tokio::task::spawn_local(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        if let Err(e) = next.fail(casync::fmterr!(msg)) {
            casync::error!("timer could not resume coroutine: {e}");
        }
    });
}

/// A completion callback that sends the outcome over a channel
pub fn observe<V: 'static>() -> (Callback<V>, oneshot::Receiver<Completion<V>>) {
    let (send, recv) = oneshot::channel();
    let callback = Callback::new(move |error, value| {
        let _ = send.send((error, value));
    });
    (callback, recv)
}

/// Run a test body on a `LocalSet`, so deferred resumptions and timers can be spawned
pub async fn local<F: Future>(future: F) -> F::Output {
    casync::log_init();
    tokio::task::LocalSet::new().run_until(future).await
}

/// Wait for the outcome, failing the test if it never arrives
pub async fn completed<V>(recv: oneshot::Receiver<Completion<V>>) -> Completion<V> {
    match tokio::time::timeout(Duration::from_secs(5), recv).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => panic!("completion callback dropped without being called"),
        Err(_) => panic!("completion callback not called in time"),
    }
}
