use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// Rate averaging follows the usual 5-second EWMA tick.
const TICK_INTERVAL: Duration = Duration::from_secs(5);

// Bounded sample window for histograms and timers.
const WINDOW_SIZE: usize = 1028;

/// Monotonically increasing event count.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    count: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Last-write-wins numeric value, stored as f64 bits.
#[derive(Debug, Clone)]
pub struct Gauge {
    bits: Arc<AtomicU64>,
}

impl Default for Gauge {
    fn default() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(0f64.to_bits())),
        }
    }
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Exponentially weighted moving average over 5-second buckets.
#[derive(Debug)]
struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    fn over_minutes(minutes: f64) -> Self {
        Self {
            alpha: 1.0 - (-(TICK_INTERVAL.as_secs_f64()) / 60.0 / minutes).exp(),
            rate: 0.0,
            initialized: false,
        }
    }

    fn tick(&mut self, instant_rate: f64) {
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Applies `ticks` empty intervals in one step.
    fn decay(&mut self, ticks: u64) {
        if self.initialized && ticks > 0 {
            self.rate *= (1.0 - self.alpha).powi(ticks.min(i32::MAX as u64) as i32);
        }
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

#[derive(Debug)]
struct MeterState {
    count: u64,
    uncounted: u64,
    start: Instant,
    last_tick: Instant,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

impl MeterState {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            count: 0,
            uncounted: 0,
            start: now,
            last_tick: now,
            m1: Ewma::over_minutes(1.0),
            m5: Ewma::over_minutes(5.0),
            m15: Ewma::over_minutes(15.0),
        }
    }

    fn tick_if_needed(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        let required = (elapsed.as_nanos() / TICK_INTERVAL.as_nanos()) as u64;
        if required == 0 {
            return;
        }

        let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;
        self.m1.tick(instant_rate);
        self.m5.tick(instant_rate);
        self.m15.tick(instant_rate);
        self.m1.decay(required - 1);
        self.m5.decay(required - 1);
        self.m15.decay(required - 1);

        // Keep the tick grid aligned to 5-second boundaries.
        let remainder = (elapsed.as_nanos() % TICK_INTERVAL.as_nanos()) as u64;
        self.last_tick = now - Duration::from_nanos(remainder);
    }

    fn mean_rate(&self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.count as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Rate-of-events instrument: total count plus 1/5/15-minute moving
/// rates and a lifetime mean rate, all per second.
#[derive(Debug, Clone)]
pub struct Meter {
    state: Arc<Mutex<MeterState>>,
}

impl Default for Meter {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MeterState::new())),
        }
    }
}

impl Meter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.mark_n(1);
    }

    pub fn mark_n(&self, n: u64) {
        let mut state = self.state.lock();
        state.tick_if_needed();
        state.count += n;
        state.uncounted += n;
    }

    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        let mut state = self.state.lock();
        state.tick_if_needed();
        MeterSnapshot {
            count: state.count,
            m1_rate: state.m1.rate(),
            m5_rate: state.m5.rate(),
            m15_rate: state.m15.rate(),
            mean_rate: state.mean_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSnapshot {
    pub count: u64,
    pub m1_rate: f64,
    pub m5_rate: f64,
    pub m15_rate: f64,
    pub mean_rate: f64,
}

#[derive(Debug, Default)]
struct HistogramState {
    count: u64,
    window: VecDeque<i64>,
}

/// Value-distribution instrument over a bounded window of the most
/// recent samples.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    state: Arc<Mutex<HistogramState>>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, value: i64) {
        let mut state = self.state.lock();
        state.count += 1;
        if state.window.len() == WINDOW_SIZE {
            state.window.pop_front();
        }
        state.window.push_back(value);
    }

    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let state = self.state.lock();
        let mut values: Vec<i64> = state.window.iter().copied().collect();
        values.sort_unstable();
        HistogramSnapshot::from_sorted(state.count, &values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
}

impl HistogramSnapshot {
    fn from_sorted(count: u64, values: &[i64]) -> Self {
        if values.is_empty() {
            return Self {
                count,
                min: 0,
                max: 0,
                mean: 0.0,
                stddev: 0.0,
                p50: 0.0,
                p75: 0.0,
                p95: 0.0,
                p98: 0.0,
                p99: 0.0,
                p999: 0.0,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;

        let stddev = if values.len() > 1 {
            let sum_sq = values.iter().map(|v| (*v as f64 - mean).powi(2)).sum::<f64>();
            (sum_sq / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        Self {
            count,
            min: values[0],
            max: values[values.len() - 1],
            mean,
            stddev,
            p50: percentile(values, 0.5),
            p75: percentile(values, 0.75),
            p95: percentile(values, 0.95),
            p98: percentile(values, 0.98),
            p99: percentile(values, 0.99),
            p999: percentile(values, 0.999),
        }
    }
}

/// Interpolated quantile over sorted samples.
fn percentile(sorted: &[i64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let pos = quantile * (sorted.len() + 1) as f64;
    if pos < 1.0 {
        return sorted[0] as f64;
    }
    if pos >= sorted.len() as f64 {
        return sorted[sorted.len() - 1] as f64;
    }

    let lower = sorted[pos as usize - 1] as f64;
    let upper = sorted[pos as usize] as f64;
    lower + (pos - pos.floor()) * (upper - lower)
}

/// Duration-distribution instrument: a histogram over elapsed
/// nanoseconds combined with a meter over occurrences.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, duration: Duration) {
        self.histogram.update(duration.as_nanos().min(i64::MAX as u128) as i64);
        self.meter.mark();
    }

    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            durations: self.histogram.snapshot(),
            rates: self.meter.snapshot(),
        }
    }
}

/// Point-in-time timer view. Duration fields are nanoseconds; the
/// reporter converts them to milliseconds at encode time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSnapshot {
    pub durations: HistogramSnapshot,
    pub rates: MeterSnapshot,
}
