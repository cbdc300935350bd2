use std::time::Duration;

use super::traits::Channel;

/// How a channel's health check came back within a time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelHealth {
    Healthy,
    Unreachable,
    /// The check neither answered nor failed within the budget; the budget
    /// rides along so the report can say how long it waited.
    TimedOut { budget: Duration },
}

/// Run the channel's own health check, bounded by `budget`.
pub(crate) async fn channel_health(channel: &dyn Channel, budget: Duration) -> ChannelHealth {
    match tokio::time::timeout(budget, channel.health_check()).await {
        Ok(true) => ChannelHealth::Healthy,
        Ok(false) => ChannelHealth::Unreachable,
        Err(_) => ChannelHealth::TimedOut { budget },
    }
}
