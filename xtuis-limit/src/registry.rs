use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use quanta::Clock;
use tracing::debug;

use super::FixedWindow;
use super::Limiter;

/// Messages the service accepts per day.
pub const MAX_TIMES_PER_DAY: usize = 300;

/// Messages the service accepts per minute.
pub const MAX_TIMES_PER_MINUTE: usize = 10;

/// Parameters of one named fixed window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowSpec {
    pub name: String,
    pub capacity: usize,
    pub window: Duration,
}

impl WindowSpec {
    pub fn new(name: impl Into<String>, capacity: usize, window: Duration) -> Self {
        Self {
            name: name.into(),
            capacity,
            window,
        }
    }

    /// The service's daily quota.
    pub fn day() -> Self {
        Self::new("day", MAX_TIMES_PER_DAY, Duration::from_secs(24 * 60 * 60))
    }

    /// The service's per-minute quota.
    pub fn minute() -> Self {
        Self::new("minute", MAX_TIMES_PER_MINUTE, Duration::from_secs(60))
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    limiter: Arc<dyn Limiter + Send + Sync>,
}

/// An ordered set of named limiters.
///
/// [`LimiterSet::check`] consults every limiter in the order they were added
/// and stops at the first one that denies. Limiters earlier in the order have
/// already consumed their unit by then.
#[derive(Debug)]
pub struct LimiterSet {
    entries: Vec<Entry>,
}

impl Default for LimiterSet {
    /// The service quotas: 300 per day, then 10 per minute.
    fn default() -> Self {
        Self::from_windows(&[WindowSpec::day(), WindowSpec::minute()])
    }
}

impl LimiterSet {
    /// An empty set which permits everything.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds one [`FixedWindow`] per spec, in order.
    pub fn from_windows(specs: &[WindowSpec]) -> Self {
        Self::from_windows_with_clock(specs, Clock::new())
    }

    /// As [`LimiterSet::from_windows`], with every window reading `clock`.
    pub fn from_windows_with_clock(specs: &[WindowSpec], clock: Clock) -> Self {
        specs.iter().fold(Self::new(), |set, spec| {
            set.with_limiter(
                spec.name.clone(),
                Arc::new(FixedWindow::with_clock(
                    spec.capacity,
                    spec.window,
                    clock.clone(),
                )),
            )
        })
    }

    /// Appends a limiter with the lowest priority so far.
    pub fn with_limiter(
        mut self,
        name: impl Into<String>,
        limiter: Arc<dyn Limiter + Send + Sync>,
    ) -> Self {
        self.entries.push(Entry {
            name: name.into(),
            limiter,
        });
        self
    }

    /// Consumes one unit from each limiter in order.
    ///
    /// Breaks with the name of the first limiter that denied.
    pub fn check(&self) -> ControlFlow<&str> {
        for entry in &self.entries {
            if !entry.limiter.limit() {
                debug!(window = %entry.name, "limit reached");
                return ControlFlow::Break(&entry.name);
            }
        }
        ControlFlow::Continue(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Limiter + Send + Sync>> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.limiter)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    // Counts how often it was consulted and never denies.
    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Limiter for Counting {
        fn limit(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn test_default_order() {
        let set = LimiterSet::default();

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["day", "minute"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_empty_set_permits() {
        let set = LimiterSet::new();

        assert!(set.is_empty());
        assert!(set.check().is_continue());
    }

    #[test]
    fn test_reports_first_exhausted_window() {
        let (clock, mock) = Clock::mock();
        let set = LimiterSet::from_windows_with_clock(
            &[
                WindowSpec::new("day", 3, Duration::from_secs(24 * 60 * 60)),
                WindowSpec::new("minute", 2, Duration::from_secs(60)),
            ],
            clock,
        );

        assert!(set.check().is_continue());
        assert!(set.check().is_continue());
        assert_eq!(set.check(), ControlFlow::Break("minute"));

        mock.increment(Duration::from_secs(61));
        // The day window spent a unit on the denied attempt above.
        assert_eq!(set.check(), ControlFlow::Break("day"));
    }

    #[test]
    fn test_stops_at_first_denial() {
        let after = Arc::new(Counting::default());
        let set = LimiterSet::new()
            .with_limiter("closed", Arc::new(FixedWindow::new(0, Duration::from_secs(60))))
            .with_limiter("after", after.clone());

        assert_eq!(set.check(), ControlFlow::Break("closed"));
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_windows_are_independent() {
        let set = LimiterSet::default();
        let day = set.get("day").unwrap();

        for _ in 0..MAX_TIMES_PER_MINUTE {
            assert!(set.check().is_continue());
        }
        assert_eq!(set.check(), ControlFlow::Break("minute"));

        // Eleven units spent on the day window, which is still open.
        assert!(day.limit());
        assert!(set.get("hour").is_none());
    }

    #[test]
    fn test_concurrent_checks() {
        use std::thread;

        let set = Arc::new(LimiterSet::from_windows(&[WindowSpec::new(
            "minute",
            25,
            Duration::from_secs(60),
        )]));

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let set = Arc::clone(&set);
                thread::spawn(move || set.check().is_continue())
            })
            .collect();

        let passed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(passed, 25);
    }
}
