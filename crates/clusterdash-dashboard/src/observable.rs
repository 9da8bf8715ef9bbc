use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// State published to the presentation layer.
///
/// Every change is applied in one step under the channel's lock, so a
/// subscriber sees either the old or the new value, never a mix.
#[derive(Debug)]
pub struct Observable<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for Observable<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> Observable<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Apply `f` and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }

    /// Apply `f`; subscribers are notified only if it returns true.
    pub fn update_if(&self, f: impl FnOnce(&mut S) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    /// Run `reset` on the state when the guard goes out of scope, including
    /// when the owning future is dropped before completing.
    pub fn reset_on_drop(&self, reset: fn(&mut S)) -> ResetGuard<S> {
        ResetGuard {
            tx: self.tx.clone(),
            reset,
        }
    }
}

impl<S: Clone> Observable<S> {
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }
}

impl<S: Clone + Send + Sync + 'static> Observable<S> {
    /// Current value followed by every later change.
    pub fn updates(&self) -> WatchStream<S> {
        WatchStream::new(self.tx.subscribe())
    }
}

pub struct ResetGuard<S> {
    tx: Arc<watch::Sender<S>>,
    reset: fn(&mut S),
}

impl<S> Drop for ResetGuard<S> {
    fn drop(&mut self) {
        self.tx.send_modify(self.reset);
    }
}
