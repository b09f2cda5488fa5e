//! Host event loop: polls the stack when its timers fall due or it signals for attention, and
//! re-issues discovery on a fixed interval until shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info};

/// Upper bound on how long the loop sleeps when the stack reports no timer.
const IDLE_POLL: Duration = Duration::from_secs(1);

/// What the loop needs from a running device stack.
pub trait StackRuntime {
    /// Run due stack work. Returns time until the next timer, or `None` if nothing is scheduled.
    fn poll(&mut self) -> Option<Duration>;
    /// Issue one discovery round.
    fn discover(&mut self);
    /// Stop the stack. Called once, after the loop ends.
    fn shutdown(&mut self);
}

/// Drive `stack` until `shutdown` resolves. The first discovery round runs immediately.
/// `wake` is notified by the stack's event-loop signal.
pub async fn run<S, F>(stack: &mut S, wake: Arc<Notify>, interval: Duration, shutdown: F)
where
    S: StackRuntime + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut rounds: u64 = 0;

    loop {
        let next = stack.poll().map_or(IDLE_POLL, |d| d.min(IDLE_POLL));
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = wake.notified() => {}
            _ = ticker.tick() => {
                rounds += 1;
                debug!(round = rounds, "discovery round");
                stack.discover();
            }
            _ = tokio::time::sleep(next) => {}
        }
    }

    info!(rounds, "event loop stopping");
    stack.shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Scripted {
        polls: usize,
        discovers: usize,
        shutdowns: usize,
        next: Option<Duration>,
    }

    impl StackRuntime for Scripted {
        fn poll(&mut self) -> Option<Duration> {
            self.polls += 1;
            self.next
        }

        fn discover(&mut self) {
            self.discovers += 1;
        }

        fn shutdown(&mut self) {
            self.shutdowns += 1;
        }
    }

    #[tokio::test]
    async fn discovers_on_interval_until_shutdown() {
        let mut stack = Scripted::default();
        let wake = Arc::new(Notify::new());
        run(
            &mut stack,
            wake,
            Duration::from_millis(40),
            tokio::time::sleep(Duration::from_millis(150)),
        )
        .await;
        assert!(stack.discovers >= 3, "discovers = {}", stack.discovers);
        assert!(stack.polls > stack.discovers);
        assert_eq!(stack.shutdowns, 1);
    }

    #[tokio::test]
    async fn wake_triggers_poll() {
        let mut stack = Scripted {
            next: Some(Duration::from_secs(60)),
            ..Scripted::default()
        };
        let wake = Arc::new(Notify::new());
        wake.notify_one();
        run(
            &mut stack,
            wake,
            Duration::from_secs(3600),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;
        // Initial poll, one after the wake, one after the first discovery round.
        assert!(stack.polls >= 3, "polls = {}", stack.polls);
        assert_eq!(stack.discovers, 1);
        assert_eq!(stack.shutdowns, 1);
    }

    #[tokio::test]
    async fn immediate_shutdown_still_stops_stack() {
        let mut stack = Scripted::default();
        let dyn_stack: &mut dyn StackRuntime = &mut stack;
        run(dyn_stack, Arc::new(Notify::new()), Duration::from_secs(1), async {}).await;
        // Shutdown is checked first, so no discovery round ran.
        assert_eq!(stack.discovers, 0);
        assert_eq!(stack.shutdowns, 1);
    }
}
