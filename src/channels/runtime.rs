use std::sync::Arc;
use std::time::Duration;

use crate::config::ReliabilityConfig;

use super::traits::{Channel, ChannelMessage};

const DEFAULT_LISTENER_INITIAL_BACKOFF_SECS: u64 = 2;
const DEFAULT_LISTENER_MAX_BACKOFF_SECS: u64 = 60;

pub(crate) fn listener_backoff_settings(reliability: &ReliabilityConfig) -> (u64, u64) {
    let initial_backoff_secs = reliability
        .listener_initial_backoff_secs
        .max(DEFAULT_LISTENER_INITIAL_BACKOFF_SECS);
    let max_backoff_secs = reliability
        .listener_max_backoff_secs
        .max(DEFAULT_LISTENER_MAX_BACKOFF_SECS);

    (initial_backoff_secs, max_backoff_secs)
}

pub(crate) fn spawn_supervised_listener(
    ch: Arc<dyn Channel>,
    tx: tokio::sync::mpsc::Sender<ChannelMessage>,
    initial_backoff_secs: u64,
    max_backoff_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = initial_backoff_secs.max(1);
        let max_backoff = max_backoff_secs.max(backoff);

        loop {
            tracing::debug!(channel = ch.name(), "channel listener starting");
            let result = ch.listen(tx.clone()).await;

            if tx.is_closed() {
                break;
            }

            match result {
                Ok(()) => {
                    tracing::warn!("Channel {} exited unexpectedly; restarting", ch.name());
                    // Clean exit -- reset backoff since the listener ran successfully
                    backoff = initial_backoff_secs.max(1);
                }
                Err(e) => {
                    tracing::error!("Channel {} error: {e}; restarting", ch.name());
                }
            }

            tokio::time::sleep(Duration::from_secs(backoff)).await;
            // Double backoff AFTER sleeping so first error uses initial_backoff
            backoff = backoff.saturating_mul(2).min(max_backoff);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysFailChannel {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Channel for AlwaysFailChannel {
        fn name(&self) -> &str {
            "test-supervised-fail"
        }

        async fn send(&self, _message: &str, _recipient: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn listen(&self, _tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("listen boom")
        }
    }

    #[tokio::test]
    async fn supervised_listener_restarts_on_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel: Arc<dyn Channel> = Arc::new(AlwaysFailChannel {
            calls: Arc::clone(&calls),
        });

        let (tx, rx) = tokio::sync::mpsc::channel::<ChannelMessage>(1);
        let handle = spawn_supervised_listener(channel, tx, 1, 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        drop(rx);
        handle.abort();
        let _ = handle.await;

        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn backoff_settings_enforce_floors() {
        let reliability = ReliabilityConfig {
            listener_initial_backoff_secs: 0,
            listener_max_backoff_secs: 1,
        };
        assert_eq!(listener_backoff_settings(&reliability), (2, 60));

        let reliability = ReliabilityConfig {
            listener_initial_backoff_secs: 5,
            listener_max_backoff_secs: 120,
        };
        assert_eq!(listener_backoff_settings(&reliability), (5, 120));
    }
}
