//! Signal-driven shutdown flag.
//!
//! A [`ShutdownSignal`] is created once at startup and handed to whoever needs
//! it: the OS signal listeners write it, the idle loop reads it. There is no
//! process-wide static; clones share the same underlying state.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{errors::Error, Result};

/// OS signals that request a graceful shutdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Interrupt => f.write_str("SIGINT"),
            SignalKind::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Shared "shutdown requested" flag.
///
/// Once requested it stays requested for the lifetime of the process.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    first: Arc<OnceLock<SignalKind>>,
}

impl ShutdownSignal {
    /// A flag with no OS handlers attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag and register it for SIGINT and SIGTERM.
    ///
    /// Must be called from inside a tokio runtime. Registration failure is
    /// fatal for the caller.
    pub fn install() -> Result<Self> {
        let signal = Self::new();
        signal.listen(SignalKind::Interrupt)?;
        #[cfg(unix)]
        signal.listen(SignalKind::Terminate)?;
        Ok(signal)
    }

    /// Record that `kind` was delivered. Idempotent.
    pub fn signal_received(&self, kind: SignalKind) {
        if self.first.set(kind).is_ok() {
            info!(signal = %kind, "shutdown requested");
        } else {
            debug!(signal = %kind, "shutdown already requested");
        }
        self.token.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The first signal that requested shutdown, if any.
    pub fn requested_by(&self) -> Option<SignalKind> {
        self.first.get().copied()
    }

    #[cfg(unix)]
    fn listen(&self, kind: SignalKind) -> Result<()> {
        use tokio::signal::unix::{signal, SignalKind as OsSignal};

        let os_kind = match kind {
            SignalKind::Interrupt => OsSignal::interrupt(),
            SignalKind::Terminate => OsSignal::terminate(),
        };
        let mut stream = signal(os_kind)
            .map_err(|e| Error::Signal(format!("failed to register {kind} handler: {e}")))?;

        let this = self.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                this.signal_received(kind);
            }
        });
        debug!(signal = %kind, "signal handler registered");
        Ok(())
    }

    #[cfg(not(unix))]
    fn listen(&self, kind: SignalKind) -> Result<()> {
        let mut stream = tokio::signal::windows::ctrl_c()
            .map_err(|e| Error::Signal(format!("failed to register {kind} handler: {e}")))?;

        let this = self.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                this.signal_received(kind);
            }
        });
        debug!(signal = %kind, "signal handler registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn starts_not_requested() {
        let s = ShutdownSignal::new();
        assert!(!s.is_shutdown_requested());
        assert_eq!(s.requested_by(), None);
    }

    #[test]
    fn signal_sets_flag() {
        let s = ShutdownSignal::new();
        s.signal_received(SignalKind::Terminate);
        assert!(s.is_shutdown_requested());
        assert_eq!(s.requested_by(), Some(SignalKind::Terminate));
    }

    #[test]
    fn repeated_signals_are_idempotent_and_keep_first_kind() {
        let s = ShutdownSignal::new();
        s.signal_received(SignalKind::Interrupt);
        s.signal_received(SignalKind::Interrupt);
        s.signal_received(SignalKind::Terminate);
        assert!(s.is_shutdown_requested());
        assert_eq!(s.requested_by(), Some(SignalKind::Interrupt));
    }

    #[test]
    fn flag_never_resets() {
        let s = ShutdownSignal::new();
        s.signal_received(SignalKind::Interrupt);
        for _ in 0..100 {
            assert!(s.is_shutdown_requested());
        }
    }

    #[test]
    fn clones_share_state() {
        let s = ShutdownSignal::new();
        let writer = s.clone();
        writer.signal_received(SignalKind::Terminate);
        assert!(s.is_shutdown_requested());
        assert_eq!(s.requested_by(), Some(SignalKind::Terminate));
    }

    #[test]
    fn signal_kind_display() {
        assert_eq!(SignalKind::Interrupt.to_string(), "SIGINT");
        assert_eq!(SignalKind::Terminate.to_string(), "SIGTERM");
    }

    async fn wait_for_request(s: &ShutdownSignal) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !s.is_shutdown_requested() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn writer_task_is_seen_by_reader() {
        let s = ShutdownSignal::new();
        let writer = s.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.signal_received(SignalKind::Interrupt);
        });
        wait_for_request(&s).await;
        assert_eq!(s.requested_by(), Some(SignalKind::Interrupt));
    }

    // Only test in this crate that raises a real signal; other tests must not
    // call `install`, or they would observe it too.
    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn installed_signal_reacts_to_sigterm() {
        let s = ShutdownSignal::install().unwrap();
        assert!(!s.is_shutdown_requested());

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        wait_for_request(&s).await;
        assert_eq!(s.requested_by(), Some(SignalKind::Terminate));
    }
}
