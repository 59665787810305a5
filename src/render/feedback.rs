// Transient feedback message ("Saved", "Copied") with a shared countdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// A message that clears itself after a fixed delay.
///
/// Each [`show()`](Self::show) replaces the message and restarts the countdown:
/// it bumps a generation counter, and a timer only clears the message if no
/// newer message arrived while it slept. Cloning yields another handle to the
/// same message.
#[derive(Clone)]
pub struct Feedback {
    inner: Arc<FeedbackInner>,
}

struct FeedbackInner {
    generation: AtomicU64,
    message_tx: watch::Sender<String>,
    delay: Duration,
    runtime: tokio::runtime::Handle,
}

impl Feedback {
    /// # Arguments
    /// * `delay` - How long a message stays visible
    /// * `runtime` - Where the clearing timers run
    pub fn new(delay: Duration, runtime: tokio::runtime::Handle) -> Self {
        let (message_tx, _) = watch::channel(String::new());
        Self {
            inner: Arc::new(FeedbackInner {
                generation: AtomicU64::new(0),
                message_tx,
                delay,
                runtime,
            }),
        }
    }

    /// Display `message` and (re)start the countdown
    pub fn show(&self, message: impl Into<String>) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.message_tx.send_replace(message.into());

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            tokio::time::sleep(inner.delay).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.message_tx.send_replace(String::new());
            }
        });
    }

    /// Message currently displayed (empty when nothing is shown)
    pub fn current(&self) -> String {
        self.inner.message_tx.borrow().clone()
    }

    /// Watch the message; the receiver sees every set and every clear
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.inner.message_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1500);

    #[tokio::test(start_paused = true)]
    async fn test_message_clears_after_delay() {
        let feedback = Feedback::new(DELAY, tokio::runtime::Handle::current());
        assert_eq!(feedback.current(), "");

        feedback.show("Saved");
        assert_eq!(feedback.current(), "Saved");

        tokio::time::sleep(Duration::from_millis(1400)).await;
        assert_eq!(feedback.current(), "Saved");

        tokio::time::sleep(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert_eq!(feedback.current(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_message_restarts_countdown() {
        let feedback = Feedback::new(DELAY, tokio::runtime::Handle::current());

        feedback.show("Saved");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        feedback.show("Copied");

        // First timer fires at 1500ms but must not clear the newer message
        tokio::time::sleep(Duration::from_millis(1000)).await;
        tokio::task::yield_now().await;
        assert_eq!(feedback.current(), "Copied");

        tokio::time::sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;
        assert_eq!(feedback.current(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_set_and_clear() {
        let feedback = Feedback::new(DELAY, tokio::runtime::Handle::current());
        let mut rx = feedback.subscribe();

        feedback.show("Copied");
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "Copied");

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "");
    }
}
