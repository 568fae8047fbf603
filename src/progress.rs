//! Progress reporting for batches.
//!
//! ```
//! use vantage::progress::Progress;
//!
//! let progress = Progress::new(|done, total, view| {
//!     eprintln!("[{}/{}] {}", done, total, view);
//! });
//! progress.report(1, 3, "car_a045_e008_t000_d002");
//! ```

/// A callback that receives `(views done, total views, last view name)`.
///
/// Batches call it from worker threads, so it must be `Send + Sync`.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, done: usize, total: usize, message: &str) {
        (self.callback)(done, total, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_callback_receives_updates() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |done, total, name| {
            sink.lock().unwrap().push((done, total, name.to_string()));
        });

        progress.report(1, 2, "a");
        progress.report(2, 2, "b");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1, 2, "a".to_string()), (2, 2, "b".to_string())]
        );

        Progress::default().report(1, 1, "ignored");
    }
}
