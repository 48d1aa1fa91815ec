// src/system/cancellation.rs

//! Operator cancellation: the shared token and the signal listener that sets it.

use std::sync::Arc;
use tokio::sync::watch;

/// The operator signal that cancelled a run. It is forwarded verbatim to the
/// subprocess that was running at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl Signal {
    /// The flag passed to `kill(1)` when forwarding this signal.
    pub fn kill_flag(self) -> &'static str {
        match self {
            Self::Interrupt => "-INT",
            Self::Terminate => "-TERM",
        }
    }
}

/// A shared, one-shot cancellation flag.
///
/// Cloning is cheap; every clone observes the same state. Only the first
/// `cancel` call is recorded.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<Option<Signal>>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Marks the token as cancelled by `signal`. Later calls are ignored.
    pub fn cancel(&self, signal: Signal) {
        self.sender.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(signal);
                true
            } else {
                false
            }
        });
    }

    /// The signal that cancelled this token, if any.
    pub fn signal(&self) -> Option<Signal> {
        *self.sender.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal().is_some()
    }

    /// Completes once the token is cancelled, yielding the cancelling signal.
    pub async fn cancelled(&self) -> Signal {
        let mut receiver = self.sender.subscribe();
        let signal = match receiver.wait_for(Option::is_some).await {
            Ok(current) => *current,
            Err(_) => None,
        };
        match signal {
            Some(signal) => signal,
            // The sender lives as long as `self`, so the channel cannot close here.
            None => std::future::pending().await,
        }
    }
}

/// Spawns a background task on the current runtime that cancels `token` on
/// Ctrl+C (and SIGTERM on Unix).
///
/// Installing the handler also means the orchestrator itself is no longer
/// killed by those signals: it waits for the running command instead.
///
/// On Unix both handlers are registered before this returns, so a signal that
/// arrives before the task is first polled is not lost.
pub fn listen_for_signals(token: &CancellationToken) -> std::io::Result<()> {
    #[cfg(unix)]
    let (mut interrupt, mut terminate) = {
        use tokio::signal::unix::{SignalKind, signal};
        (
            signal(SignalKind::interrupt())?,
            signal(SignalKind::terminate())?,
        )
    };

    let token = token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let signal = tokio::select! {
            Some(()) = interrupt.recv() => Signal::Interrupt,
            Some(()) = terminate.recv() => Signal::Terminate,
            else => return,
        };

        #[cfg(not(unix))]
        let signal = match tokio::signal::ctrl_c().await {
            Ok(()) => Signal::Interrupt,
            Err(e) => {
                log::warn!("Could not listen for Ctrl+C: {}", e);
                return;
            }
        };

        log::debug!("Received {:?}, cancelling the run.", signal);
        token.cancel(signal);
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_cancel_wins() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel(Signal::Terminate);
        token.clone().cancel(Signal::Interrupt);

        assert_eq!(token.signal(), Some(Signal::Terminate));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_for_clones() {
        let token = CancellationToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        token.cancel(Signal::Interrupt);

        assert_eq!(handle.await.unwrap(), Signal::Interrupt);
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel(Signal::Interrupt);
        assert_eq!(token.cancelled().await, Signal::Interrupt);
    }
}
