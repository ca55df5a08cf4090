//! Request lifecycle hooks.
//!
//! A streaming or HTTP session reports what happens to each request through
//! a [`RequestObserver`]. Every hook defaults to a no-op, so an observer only
//! implements the events it cares about.

/// Hooks invoked as requests are sent and responses arrive.
///
/// - `on_done` runs for every response that decoded successfully.
/// - `on_error` runs for a request that could not be encoded or written.
/// - `on_always` runs alongside either of the above, and for every inbound
///   message regardless of whether it decoded. It receives `None` for an
///   inbound message that failed to decode.
///
/// Hooks may be called from the receive and send procedures of one session
/// concurrently, hence the `Sync` bound.
pub trait RequestObserver<T>: Send + Sync {
    fn on_done(&self, _response: &T) {}

    fn on_error(&self, _request: &T) {}

    fn on_always(&self, _message: Option<&T>) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<T> RequestObserver<T> for NoopObserver {}

type Hook<T> = Box<dyn Fn(&T) + Send + Sync>;
type AlwaysHook<T> = Box<dyn Fn(Option<&T>) + Send + Sync>;

/// Observer assembled from optional closures.
///
/// # Example
///
/// ```
/// use flowlink_client::{Callbacks, RequestObserver};
/// use flowlink_common::DataRequest;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let done = Arc::new(AtomicUsize::new(0));
/// let counter = done.clone();
/// let callbacks = Callbacks::<DataRequest>::new()
///     .done(move |_| { counter.fetch_add(1, Ordering::SeqCst); });
///
/// callbacks.on_done(&DataRequest::default());
/// callbacks.on_error(&DataRequest::default());
/// assert_eq!(done.load(Ordering::SeqCst), 1);
/// ```
pub struct Callbacks<T> {
    done: Option<Hook<T>>,
    error: Option<Hook<T>>,
    always: Option<AlwaysHook<T>>,
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self {
            done: None,
            error: None,
            always: None,
        }
    }
}

impl<T> Callbacks<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the closure run by `on_done`.
    pub fn done<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.done = Some(Box::new(f));
        self
    }

    /// Sets the closure run by `on_error`.
    pub fn error<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    /// Sets the closure run by `on_always`.
    pub fn always<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&T>) + Send + Sync + 'static,
    {
        self.always = Some(Box::new(f));
        self
    }
}

impl<T> RequestObserver<T> for Callbacks<T> {
    fn on_done(&self, response: &T) {
        if let Some(done) = &self.done {
            done(response);
        }
    }

    fn on_error(&self, request: &T) {
        if let Some(error) = &self.error {
            error(request);
        }
    }

    fn on_always(&self, message: Option<&T>) {
        if let Some(always) = &self.always {
            always(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_noop_observer_accepts_everything() {
        let observer = NoopObserver;
        RequestObserver::<u32>::on_done(&observer, &1);
        RequestObserver::<u32>::on_error(&observer, &2);
        RequestObserver::<u32>::on_always(&observer, None);
    }

    #[test]
    fn test_callbacks_dispatch_to_set_hooks() {
        let log = std::sync::Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let callbacks = Callbacks::<u32>::new()
            .done(move |v| a.lock().unwrap().push(format!("done {}", v)))
            .error(move |v| b.lock().unwrap().push(format!("error {}", v)))
            .always(move |v| c.lock().unwrap().push(format!("always {:?}", v)));

        callbacks.on_done(&1);
        callbacks.on_error(&2);
        callbacks.on_always(Some(&3));
        callbacks.on_always(None);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["done 1", "error 2", "always Some(3)", "always None"]
        );
    }

    fn fire<O: RequestObserver<u32> + ?Sized>(observer: &O) {
        observer.on_done(&7);
        observer.on_always(Some(&7));
        observer.on_error(&8);
        observer.on_always(Some(&8));
    }

    #[test]
    fn test_callbacks_dispatch_through_observer_bound() {
        let done = std::sync::Arc::new(Mutex::new(Vec::new()));
        let always = std::sync::Arc::new(Mutex::new(0usize));
        let (d, a) = (done.clone(), always.clone());
        let callbacks = Callbacks::<u32>::new()
            .done(move |v| d.lock().unwrap().push(*v))
            .always(move |_| *a.lock().unwrap() += 1);

        fire(&callbacks);
        let dynamic: &dyn RequestObserver<u32> = &callbacks;
        fire(dynamic);

        assert_eq!(*done.lock().unwrap(), vec![7, 7]);
        assert_eq!(*always.lock().unwrap(), 4);
    }

    #[test]
    fn test_unset_hooks_are_skipped() {
        let callbacks = Callbacks::<u32>::new();
        callbacks.on_done(&1);
        callbacks.on_error(&1);
        callbacks.on_always(Some(&1));
    }
}
