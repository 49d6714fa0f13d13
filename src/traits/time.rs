/// Abstraction over time sources.
/// Implementations: SystemTimeProvider (production), MockTimeProvider (testing).
pub trait TimeProvider {
    /// Current monotonic time in milliseconds from an arbitrary epoch.
    fn now_ms(&self) -> f64;
}

/// System time provider using std::time::Instant.
pub struct SystemTimeProvider {
    start: std::time::Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Mock time provider for deterministic testing.
pub struct MockTimeProvider {
    current_ms: std::cell::Cell<f64>,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self {
            current_ms: std::cell::Cell::new(0.0),
        }
    }

    pub fn set_time(&self, ms: f64) {
        self.current_ms.set(ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.current_ms.set(self.current_ms.get() + delta_ms);
    }
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_ms(&self) -> f64 {
        self.current_ms.get()
    }
}

/// A shared handle to a time source is itself a time source. Lets a test
/// keep hold of a MockTimeProvider it has handed to a playback.
impl<T: TimeProvider> TimeProvider for std::rc::Rc<T> {
    fn now_ms(&self) -> f64 {
        self.as_ref().now_ms()
    }
}
