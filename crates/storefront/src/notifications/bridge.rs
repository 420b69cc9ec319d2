//! Task that turns push events into toasts and refetches.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Notification, PushError, RawEvent, Refetch, Subscription, Toast};

/// Capacity of the toast channel.
const TOAST_CAPACITY: usize = 32;

/// Routes push events for one subscription.
///
/// Subscribe to toasts before calling [`spawn`](Self::spawn) so none are
/// missed.
#[derive(Debug)]
pub struct NotificationBridge {
    subscription: Subscription,
    toasts: broadcast::Sender<Toast>,
}

impl NotificationBridge {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let (toasts, _) = broadcast::channel(TOAST_CAPACITY);
        Self {
            subscription,
            toasts,
        }
    }

    /// Receive toasts published by the bridge.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.toasts.subscribe()
    }

    /// Start consuming `events`.
    ///
    /// Every recognised notification publishes a toast and then awaits a
    /// full refetch of `target`. Events are handled one at a time in
    /// arrival order. Malformed payloads and transport errors are logged
    /// and skipped. The task ends when the stream does or the returned
    /// handle is dropped.
    pub fn spawn<E, R>(self, events: E, target: Arc<R>) -> BridgeHandle
    where
        E: Stream<Item = Result<RawEvent, PushError>> + Send + 'static,
        R: Refetch,
    {
        let toasts = self.toasts.clone();
        let task = tokio::spawn(run(self.subscription, events, target, self.toasts));
        BridgeHandle {
            task: Some(task),
            toasts,
        }
    }
}

async fn run<E, R>(
    subscription: Subscription,
    events: E,
    target: Arc<R>,
    toasts: broadcast::Sender<Toast>,
) where
    E: Stream<Item = Result<RawEvent, PushError>> + Send,
    R: Refetch,
{
    let mut events = std::pin::pin!(events);
    info!(scope = %subscription.scope_param(), "Notification bridge started");

    while let Some(event) = events.next().await {
        let raw = match event {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Push channel error");
                continue;
            }
        };

        match Notification::parse(&subscription, &raw) {
            Ok(Some(notification)) => {
                let toast = notification.toast();
                debug!(event = %raw.event, toast = %toast, "Notification received");
                // Nobody listening for toasts is fine; the refetch still runs.
                let _ = toasts.send(toast);
                target.refetch().await;
            }
            Ok(None) => debug!(event = %raw.event, "Ignoring unsubscribed event"),
            Err(e) => warn!(error = %e, "Skipping malformed notification"),
        }
    }

    info!("Notification stream ended");
}

/// Owns a running bridge task.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct BridgeHandle {
    task: Option<JoinHandle<()>>,
    toasts: broadcast::Sender<Toast>,
}

impl BridgeHandle {
    /// Receive toasts published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.toasts.subscribe()
    }

    /// Whether the task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the task.
    pub fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait for the event stream to end.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            warn!(error = %e, "Notification bridge task failed");
        }
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
