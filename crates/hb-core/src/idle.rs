use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, trace};

use crate::shutdown::ShutdownSignal;

/// Sleep between shutdown checks. A signal is noticed at most this late.
pub const IDLE_INTERVAL: Duration = Duration::from_secs(1);

/// Keep the caller alive until shutdown is requested.
///
/// Sleeps `interval`, then checks the flag, and returns on the first check that
/// sees it set. The return value is the number of sleep/check iterations.
pub async fn idle_until_shutdown(shutdown: &ShutdownSignal, interval: Duration) -> u64 {
    let mut iterations = 0u64;
    loop {
        sleep(interval).await;
        iterations += 1;
        if shutdown.is_shutdown_requested() {
            debug!(iterations, "idle loop observed shutdown");
            return iterations;
        }
        trace!(iterations, "idle");
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::shutdown::SignalKind;

    // Paused-clock deadlines are rounded to the timer's millisecond tick.
    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual <= expected + Duration::from_millis(5),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn already_requested_exits_after_one_interval() {
        let s = ShutdownSignal::new();
        s.signal_received(SignalKind::Interrupt);

        let started = Instant::now();
        let n = idle_until_shutdown(&s, IDLE_INTERVAL).await;
        assert_eq!(n, 1);
        assert_close(started.elapsed(), IDLE_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn signal_mid_sleep_is_seen_within_one_interval() {
        let s = ShutdownSignal::new();
        let writer = s.clone();
        let delivered_after = Duration::from_millis(2500);
        tokio::spawn(async move {
            sleep(delivered_after).await;
            writer.signal_received(SignalKind::Terminate);
        });

        let started = Instant::now();
        let n = idle_until_shutdown(&s, IDLE_INTERVAL).await;
        let elapsed = started.elapsed();

        assert_eq!(n, 3);
        assert!(elapsed >= delivered_after);
        assert!(elapsed - delivered_after <= IDLE_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_idling_without_a_signal() {
        let s = ShutdownSignal::new();
        let res = tokio::time::timeout(
            Duration::from_secs(30),
            idle_until_shutdown(&s, IDLE_INTERVAL),
        )
        .await;
        assert!(res.is_err(), "loop must not exit without a shutdown request");
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval_is_respected() {
        let s = ShutdownSignal::new();
        let writer = s.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(45)).await;
            writer.signal_received(SignalKind::Interrupt);
        });

        let started = Instant::now();
        let n = idle_until_shutdown(&s, Duration::from_millis(10)).await;
        assert_eq!(n, 5);
        assert_close(started.elapsed(), Duration::from_millis(50));
    }
}
