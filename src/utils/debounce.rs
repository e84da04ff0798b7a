//! Quiet-period debouncing for search input. Library API: reached through
//! `FeedHandle::search_debouncer` by embedders that drive a live search box.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Forwards only the last value of a burst, once `delay` has passed without a newer one.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn<F, Fut>(delay: Duration, on_settle: F) -> Self
    where
        F: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        tokio::spawn(async move {
            while let Some(mut pending) = rx.recv().await {
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(value) => pending = value,
                            None => {
                                on_settle(pending).await;
                                return;
                            }
                        },
                        _ = tokio::time::sleep(delay) => break,
                    }
                }
                on_settle(pending).await;
            }
        });

        Self { tx }
    }

    pub fn push(&self, value: T) {
        if self.tx.send(value).is_err() {
            tracing::debug!("debouncer task has stopped; dropping input");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Debouncer<String>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let debouncer = Debouncer::spawn(SEARCH_DEBOUNCE, move |q: String| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(q);
            }
        });
        (calls, debouncer)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_value() {
        let (calls, debouncer) = recorder();
        debouncer.push("tax".to_string());
        debouncer.push("tax c".to_string());

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(*calls.lock().unwrap(), vec!["tax c".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_quiet_period() {
        let (calls, debouncer) = recorder();
        debouncer.push("audit".to_string());
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.push("audit fees".to_string());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(calls.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["audit fees".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_fire_separately() {
        let (calls, debouncer) = recorder();
        debouncer.push("vat".to_string());
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.push("payroll".to_string());
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["vat".to_string(), "payroll".to_string()]
        );
    }
}
