//! Startup / idle / teardown sequence around the external bot client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::{idle::idle_until_shutdown, shutdown::ShutdownSignal, Result};

/// What the process needs from a chat-bot client library.
///
/// The client owns its own event processing; the runner only starts it and
/// tears it down again.
#[async_trait]
pub trait BotClient: Send {
    /// Authenticate and begin accepting inbound events.
    async fn start(&mut self) -> Result<()>;

    /// Stop taking new inbound events.
    async fn stop_accepting(&mut self) -> Result<()>;

    /// Stop the event-processing mechanism, letting in-flight work finish.
    async fn stop(&mut self) -> Result<()>;

    /// Release any resources held by the client.
    async fn release(&mut self) -> Result<()>;
}

/// Start `client`, idle until `shutdown` is requested, then tear down.
///
/// A start failure is returned straight away: no idling and no teardown.
/// Teardown always runs every step; the first error among them is returned.
pub async fn run_until_shutdown<C>(
    client: &mut C,
    shutdown: &ShutdownSignal,
    interval: Duration,
) -> Result<()>
where
    C: BotClient + ?Sized,
{
    client.start().await?;
    info!("bot started; waiting for shutdown signal");

    idle_until_shutdown(shutdown, interval).await;
    match shutdown.requested_by() {
        Some(kind) => info!(signal = %kind, "shutting down"),
        None => info!("shutting down"),
    }

    let mut first_err = None;
    let steps = [
        ("stop_accepting", client.stop_accepting().await),
        ("stop", client.stop().await),
        ("release", client.release().await),
    ];
    for (step, res) in steps {
        if let Err(e) = res {
            error!(step, error = %e, "teardown step failed");
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => {
            info!("shutdown complete");
            Ok(())
        }
    }
}
