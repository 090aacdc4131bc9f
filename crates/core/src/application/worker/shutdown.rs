// Cooperative shutdown signal shared by a group of loops

use tokio::sync::watch;

/// Shutdown signal for graceful termination
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the shutdown signal
    pub async fn wait(&mut self) {
        let _ = self.rx.changed().await;
    }
}

/// Shutdown sender
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to every holder of the matching token
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_observes_signal() {
        let (sender, mut token) = shutdown_channel();
        assert!(!token.is_shutdown());

        sender.shutdown();
        token.wait().await;
        assert!(token.is_shutdown());
    }

    #[tokio::test]
    async fn cloned_tokens_all_observe_signal() {
        let (sender, token) = shutdown_channel();
        let mut a = token.clone();
        let mut b = token;

        sender.shutdown();
        a.wait().await;
        b.wait().await;
        assert!(a.is_shutdown() && b.is_shutdown());
    }
}
