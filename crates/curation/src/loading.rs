use tokio::sync::watch;

/// Process-wide "something is loading" flag.
///
/// Backed by an in-flight counter rather than a boolean: the indicator stays
/// visible until every overlapping request has settled.
#[derive(Clone, Debug)]
pub struct LoadingIndicator {
    in_flight: watch::Sender<usize>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { in_flight: tx }
    }

    /// Register one request. Dropping the guard settles it, on success,
    /// failure or cancellation alike.
    pub fn begin(&self) -> LoadingGuard {
        self.in_flight.send_modify(|n| *n += 1);
        LoadingGuard { in_flight: self.in_flight.clone() }
    }

    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    pub fn is_visible(&self) -> bool {
        self.in_flight() > 0
    }

    /// Watch the in-flight count; visible iff the value is non-zero.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.in_flight.subscribe()
    }
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[must_use = "the request is settled as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LoadingGuard {
    in_flight: watch::Sender<usize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_requests_keep_indicator_visible() {
        let loading = LoadingIndicator::new();
        assert!(!loading.is_visible());

        let a = loading.begin();
        let b = loading.begin();
        assert_eq!(loading.in_flight(), 2);

        // first one settles, the other is still running
        drop(a);
        assert!(loading.is_visible());

        drop(b);
        assert!(!loading.is_visible());
    }

    #[test]
    fn test_clones_share_the_counter() {
        let loading = LoadingIndicator::new();
        let other = loading.clone();
        let _g = other.begin();
        assert!(loading.is_visible());
    }

    #[tokio::test]
    async fn test_subscriber_sees_settle() {
        let loading = LoadingIndicator::new();
        let mut rx = loading.subscribe();

        let guard = loading.begin();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);

        drop(guard);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 0);
    }
}
