//! Operator prompt for actions that need one extra value.
//!
//! There is a single prompt surface, so the broker holds at most one open
//! request. A second `request_input` while one is open fails with
//! [`PromptError::Busy`]; it never takes over the open request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use scandesk_core::types::PromptKind;
use tokio::sync::{oneshot, watch};

use crate::error::PromptError;

struct OpenPrompt {
    ticket: u64,
    kind: PromptKind,
    reply: oneshot::Sender<String>,
}

/// Bridges the prompt surface into the async pipeline.
///
/// The surface watches [`PromptBroker::subscribe`] to know when to show or
/// hide itself, then calls [`resolve`](PromptBroker::resolve) or
/// [`dismiss`](PromptBroker::dismiss).
pub struct PromptBroker {
    open: Mutex<Option<OpenPrompt>>,
    next_ticket: AtomicU64,
    surface: watch::Sender<Option<PromptKind>>,
}

impl PromptBroker {
    pub fn new() -> Self {
        let (surface, _) = watch::channel(None);
        Self {
            open: Mutex::new(None),
            next_ticket: AtomicU64::new(1),
            surface,
        }
    }

    /// Open a prompt of `kind` and wait for the operator.
    ///
    /// Resolves with the entered value, or fails with `Dismissed` when the
    /// operator cancels. Dropping the returned future closes the prompt.
    pub async fn request_input(&self, kind: PromptKind) -> Result<String, PromptError> {
        let (reply, answer) = oneshot::channel();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        {
            let mut open = self.slot();
            if let Some(current) = open.as_ref() {
                tracing::warn!(requested = %kind, open = %current.kind, "Prompt already open");
                return Err(PromptError::Busy { open: current.kind });
            }
            *open = Some(OpenPrompt {
                ticket,
                kind,
                reply,
            });
        }
        self.surface.send_replace(Some(kind));
        tracing::debug!(kind = %kind, ticket, "Prompt opened");

        let _close = CloseOnDrop {
            broker: self,
            ticket,
        };
        answer.await.map_err(|_| PromptError::Dismissed)
    }

    /// Deliver `value` to the open prompt.
    pub fn resolve(&self, value: impl Into<String>) -> Result<(), PromptError> {
        let open = self.slot().take().ok_or(PromptError::NoPending)?;
        self.surface.send_replace(None);
        tracing::debug!(kind = %open.kind, ticket = open.ticket, "Prompt answered");
        open.reply
            .send(value.into())
            .map_err(|_| PromptError::Abandoned)
    }

    /// Cancel the open prompt. Returns `false` if nothing was open.
    pub fn dismiss(&self) -> bool {
        let Some(open) = self.slot().take() else {
            return false;
        };
        self.surface.send_replace(None);
        tracing::debug!(kind = %open.kind, ticket = open.ticket, "Prompt dismissed");
        // Dropping the sender fails the waiting receiver with Dismissed.
        drop(open);
        true
    }

    /// Kind of the currently open prompt, if any.
    pub fn pending(&self) -> Option<PromptKind> {
        self.slot().as_ref().map(|open| open.kind)
    }

    /// Observe the open prompt: `Some(kind)` while open, `None` otherwise.
    pub fn subscribe(&self) -> watch::Receiver<Option<PromptKind>> {
        self.surface.subscribe()
    }

    fn slot(&self) -> MutexGuard<'_, Option<OpenPrompt>> {
        // The slot holds no invariant a panicking holder could break.
        self.open.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for PromptBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the slot if the waiting future goes away while still open.
struct CloseOnDrop<'a> {
    broker: &'a PromptBroker,
    ticket: u64,
}

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        let mut open = self.broker.slot();
        if open.as_ref().is_some_and(|p| p.ticket == self.ticket) {
            *open = None;
            drop(open);
            self.broker.surface.send_replace(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::wait_until;
    use std::sync::Arc;

    fn open_prompt(broker: &Arc<PromptBroker>) -> tokio::task::JoinHandle<Result<String, PromptError>> {
        let broker = Arc::clone(broker);
        tokio::spawn(async move { broker.request_input(PromptKind::ItemBarcode).await })
    }

    #[tokio::test]
    async fn test_resolve_delivers_value() {
        let broker = Arc::new(PromptBroker::new());
        let waiting = open_prompt(&broker);
        wait_until(|| broker.pending().is_some()).await;

        assert_eq!(broker.pending(), Some(PromptKind::ItemBarcode));
        broker.resolve("BC123").unwrap();

        assert_eq!(waiting.await.unwrap().unwrap(), "BC123");
        assert_eq!(broker.pending(), None);
    }

    #[tokio::test]
    async fn test_dismiss_fails_waiter() {
        let broker = Arc::new(PromptBroker::new());
        let waiting = open_prompt(&broker);
        wait_until(|| broker.pending().is_some()).await;

        assert!(broker.dismiss());
        assert_eq!(waiting.await.unwrap(), Err(PromptError::Dismissed));
        assert_eq!(broker.pending(), None);
    }

    #[tokio::test]
    async fn test_second_request_is_busy_and_first_survives() {
        let broker = Arc::new(PromptBroker::new());
        let first = open_prompt(&broker);
        wait_until(|| broker.pending().is_some()).await;

        let second = broker.request_input(PromptKind::ItemBarcode).await;
        assert_eq!(
            second,
            Err(PromptError::Busy {
                open: PromptKind::ItemBarcode
            })
        );

        // The first request still owns the surface.
        assert_eq!(broker.pending(), Some(PromptKind::ItemBarcode));
        broker.resolve("ITEM-1").unwrap();
        assert_eq!(first.await.unwrap().unwrap(), "ITEM-1");
    }

    #[test]
    fn test_resolve_without_prompt() {
        let broker = PromptBroker::new();
        assert_eq!(broker.resolve("x"), Err(PromptError::NoPending));
    }

    #[test]
    fn test_dismiss_without_prompt() {
        let broker = PromptBroker::new();
        assert!(!broker.dismiss());
    }

    #[tokio::test]
    async fn test_dropped_waiter_closes_prompt() {
        let broker = Arc::new(PromptBroker::new());
        let waiting = open_prompt(&broker);
        wait_until(|| broker.pending().is_some()).await;

        waiting.abort();
        let _ = waiting.await;

        assert_eq!(broker.pending(), None);
        assert_eq!(*broker.subscribe().borrow(), None);
        // The surface is free again.
        let again = open_prompt(&broker);
        wait_until(|| broker.pending().is_some()).await;
        assert!(broker.dismiss());
        assert_eq!(again.await.unwrap(), Err(PromptError::Dismissed));
    }

    #[tokio::test]
    async fn test_subscribe_tracks_open_and_close() {
        let broker = Arc::new(PromptBroker::new());
        let mut surface = broker.subscribe();
        assert_eq!(*surface.borrow(), None);

        let waiting = open_prompt(&broker);
        surface.changed().await.unwrap();
        assert_eq!(*surface.borrow_and_update(), Some(PromptKind::ItemBarcode));

        broker.resolve("BC1").unwrap();
        surface.changed().await.unwrap();
        assert_eq!(*surface.borrow_and_update(), None);
        assert_eq!(waiting.await.unwrap().unwrap(), "BC1");
    }
}
