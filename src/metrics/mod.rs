pub mod filter;
pub mod instruments;

pub use filter::NameSelector;
pub use instruments::{
    Counter, Gauge, Histogram, HistogramSnapshot, Meter, MeterSnapshot, Timer, TimerSnapshot,
};

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// One registered instrument.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Counter),
    Gauge(Gauge),
    Meter(Meter),
    Histogram(Histogram),
    Timer(Timer),
}

impl Metric {
    fn kind(&self) -> &'static str {
        match self {
            Self::Counter(_) => "counter",
            Self::Gauge(_) => "gauge",
            Self::Meter(_) => "meter",
            Self::Histogram(_) => "histogram",
            Self::Timer(_) => "timer",
        }
    }

    fn value(&self) -> MetricValue {
        match self {
            Self::Counter(counter) => MetricValue::Counter(counter.count()),
            Self::Gauge(gauge) => MetricValue::Gauge(gauge.value()),
            Self::Meter(meter) => MetricValue::Meter(meter.snapshot()),
            Self::Histogram(histogram) => MetricValue::Histogram(histogram.snapshot()),
            Self::Timer(timer) => MetricValue::Timer(timer.snapshot()),
        }
    }
}

/// Point-in-time value of one instrument, captured for a single
/// encode-and-send cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Counter(u64),
    Gauge(f64),
    Meter(MeterSnapshot),
    Histogram(HistogramSnapshot),
    Timer(TimerSnapshot),
}

/// Shared, concurrently-mutated instrument registry keyed by dotted
/// metric name. Handles returned by the accessors stay live after
/// registration; snapshots are consistent point-in-time views.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: Arc<RwLock<BTreeMap<String, Metric>>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter registered under `name`, registering a new
    /// one if needed. A name clash with a different instrument kind
    /// replaces the previous registration with a warning; the same
    /// applies to the other accessors.
    pub fn counter(&self, name: &str) -> Counter {
        let mut metrics = self.metrics.write();
        if let Some(Metric::Counter(counter)) = metrics.get(name) {
            return counter.clone();
        }
        self.warn_on_replace(&metrics, name, "counter");
        let counter = Counter::new();
        metrics.insert(name.to_string(), Metric::Counter(counter.clone()));
        counter
    }

    pub fn gauge(&self, name: &str) -> Gauge {
        let mut metrics = self.metrics.write();
        if let Some(Metric::Gauge(gauge)) = metrics.get(name) {
            return gauge.clone();
        }
        self.warn_on_replace(&metrics, name, "gauge");
        let gauge = Gauge::new();
        metrics.insert(name.to_string(), Metric::Gauge(gauge.clone()));
        gauge
    }

    pub fn meter(&self, name: &str) -> Meter {
        let mut metrics = self.metrics.write();
        if let Some(Metric::Meter(meter)) = metrics.get(name) {
            return meter.clone();
        }
        self.warn_on_replace(&metrics, name, "meter");
        let meter = Meter::new();
        metrics.insert(name.to_string(), Metric::Meter(meter.clone()));
        meter
    }

    pub fn histogram(&self, name: &str) -> Histogram {
        let mut metrics = self.metrics.write();
        if let Some(Metric::Histogram(histogram)) = metrics.get(name) {
            return histogram.clone();
        }
        self.warn_on_replace(&metrics, name, "histogram");
        let histogram = Histogram::new();
        metrics.insert(name.to_string(), Metric::Histogram(histogram.clone()));
        histogram
    }

    pub fn timer(&self, name: &str) -> Timer {
        let mut metrics = self.metrics.write();
        if let Some(Metric::Timer(timer)) = metrics.get(name) {
            return timer.clone();
        }
        self.warn_on_replace(&metrics, name, "timer");
        let timer = Timer::new();
        metrics.insert(name.to_string(), Metric::Timer(timer.clone()));
        timer
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }

    /// Captures the current value of every instrument accepted by
    /// `selector`, in name order.
    pub fn snapshot(&self, selector: &NameSelector) -> Vec<(String, MetricValue)> {
        self.metrics
            .read()
            .iter()
            .filter(|(name, _)| selector.accepts(name))
            .map(|(name, metric)| (name.clone(), metric.value()))
            .collect()
    }

    fn warn_on_replace(&self, metrics: &BTreeMap<String, Metric>, name: &str, kind: &str) {
        if let Some(existing) = metrics.get(name) {
            warn!(
                "Metric {name} was already registered as a {}, replacing it with a {kind}",
                existing.kind()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_the_same_instrument() {
        let registry = MetricRegistry::new();
        registry.counter("messages.count").inc();
        registry.counter("messages.count").inc();
        assert_eq!(registry.counter("messages.count").count(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn kind_clash_replaces_the_registration() {
        let registry = MetricRegistry::new();
        registry.counter("clash").inc();
        registry.gauge("clash").set(1.5);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.gauge("clash").value(), 1.5);
    }

    #[test]
    fn snapshot_is_ordered_by_name() {
        let registry = MetricRegistry::new();
        registry.counter("b.count").inc();
        registry.counter("a.count").inc_by(2);
        registry.gauge("c.level").set(0.5);

        let snapshot = registry.snapshot(&NameSelector::All);
        let names: Vec<&str> = snapshot.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a.count", "b.count", "c.level"]);
        assert_eq!(snapshot[0].1, MetricValue::Counter(2));
        assert_eq!(snapshot[2].1, MetricValue::Gauge(0.5));
    }

    #[test]
    fn snapshot_respects_the_selector() {
        let registry = MetricRegistry::new();
        registry.counter("com.hivemq.messages.incoming").inc();
        registry.counter("com.hivemq.sessions.active").inc();

        let prefixes = vec!["com.hivemq.messages".to_string()];
        let filtered = registry.snapshot(&NameSelector::Matching(prefixes.clone()));
        let remaining = registry.snapshot(&NameSelector::NotMatching(prefixes));

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0, "com.hivemq.messages.incoming");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, "com.hivemq.sessions.active");
    }
}
