use super::line_protocol::{FieldValue, write_record};
use crate::metrics::{HistogramSnapshot, MeterSnapshot, MetricValue, TimerSnapshot};
use std::collections::BTreeMap;

// Timer durations are recorded in nanoseconds and reported in
// milliseconds; rates are already per second.
const DURATION_FACTOR: f64 = 1.0 / 1_000_000.0;

/// Encodes one registry snapshot into a line-protocol batch.
///
/// Field inclusion per instrument kind: counters and gauges are
/// singleton-field; meters carry {count, m1_rate, m5_rate, m15_rate,
/// mean_rate}; timers carry the meter fields plus {min, max, mean,
/// stddev, p50, p75, p95, p98, p99, p999}; histograms carry the timer
/// fields minus the rates.
pub(crate) fn encode_batch(
    snapshot: &[(String, MetricValue)],
    prefix: &str,
    tags: &BTreeMap<String, String>,
    timestamp: u64,
) -> String {
    let mut buf = String::new();

    for (name, value) in snapshot {
        match value {
            MetricValue::Counter(count) => {
                let fields = [("count", FieldValue::Integer(*count as i64))];
                write_record(&mut buf, prefix, name, tags, &fields, timestamp);
            }
            MetricValue::Gauge(gauge) => {
                let fields = [("value", FieldValue::Float(*gauge))];
                write_record(&mut buf, prefix, name, tags, &fields, timestamp);
            }
            MetricValue::Meter(meter) => {
                let fields = meter_fields(meter);
                write_record(&mut buf, prefix, name, tags, &fields, timestamp);
            }
            MetricValue::Histogram(histogram) => {
                let fields = histogram_fields(histogram);
                write_record(&mut buf, prefix, name, tags, &fields, timestamp);
            }
            MetricValue::Timer(timer) => {
                let fields = timer_fields(timer);
                write_record(&mut buf, prefix, name, tags, &fields, timestamp);
            }
        }
    }

    buf
}

fn meter_fields(meter: &MeterSnapshot) -> [(&'static str, FieldValue); 5] {
    [
        ("count", FieldValue::Integer(meter.count as i64)),
        ("m1_rate", FieldValue::Float(meter.m1_rate)),
        ("m5_rate", FieldValue::Float(meter.m5_rate)),
        ("m15_rate", FieldValue::Float(meter.m15_rate)),
        ("mean_rate", FieldValue::Float(meter.mean_rate)),
    ]
}

fn histogram_fields(histogram: &HistogramSnapshot) -> [(&'static str, FieldValue); 11] {
    [
        ("count", FieldValue::Integer(histogram.count as i64)),
        ("min", FieldValue::Integer(histogram.min)),
        ("max", FieldValue::Integer(histogram.max)),
        ("mean", FieldValue::Float(histogram.mean)),
        ("stddev", FieldValue::Float(histogram.stddev)),
        ("p50", FieldValue::Float(histogram.p50)),
        ("p75", FieldValue::Float(histogram.p75)),
        ("p95", FieldValue::Float(histogram.p95)),
        ("p98", FieldValue::Float(histogram.p98)),
        ("p99", FieldValue::Float(histogram.p99)),
        ("p999", FieldValue::Float(histogram.p999)),
    ]
}

fn timer_fields(timer: &TimerSnapshot) -> [(&'static str, FieldValue); 15] {
    let durations = &timer.durations;
    let rates = &timer.rates;
    [
        ("count", FieldValue::Integer(durations.count as i64)),
        ("min", FieldValue::Float(durations.min as f64 * DURATION_FACTOR)),
        ("max", FieldValue::Float(durations.max as f64 * DURATION_FACTOR)),
        ("mean", FieldValue::Float(durations.mean * DURATION_FACTOR)),
        ("stddev", FieldValue::Float(durations.stddev * DURATION_FACTOR)),
        ("p50", FieldValue::Float(durations.p50 * DURATION_FACTOR)),
        ("p75", FieldValue::Float(durations.p75 * DURATION_FACTOR)),
        ("p95", FieldValue::Float(durations.p95 * DURATION_FACTOR)),
        ("p98", FieldValue::Float(durations.p98 * DURATION_FACTOR)),
        ("p99", FieldValue::Float(durations.p99 * DURATION_FACTOR)),
        ("p999", FieldValue::Float(durations.p999 * DURATION_FACTOR)),
        ("m1_rate", FieldValue::Float(rates.m1_rate)),
        ("m5_rate", FieldValue::Float(rates.m5_rate)),
        ("m15_rate", FieldValue::Float(rates.m15_rate)),
        ("mean_rate", FieldValue::Float(rates.mean_rate)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn counter_encodes_as_integer_count() {
        let snapshot = vec![(
            "com.hivemq.messages.incoming.publish.count".to_string(),
            MetricValue::Counter(3),
        )];
        let batch = encode_batch(&snapshot, "", &tags(&[("host", "node1")]), 1_700_000_000);
        assert_eq!(
            batch,
            "com.hivemq.messages.incoming.publish.count,host=node1 count=3i 1700000000\n"
        );
    }

    #[test]
    fn gauge_encodes_single_value_field() {
        let snapshot = vec![("heap.usage".to_string(), MetricValue::Gauge(0.82))];
        let batch = encode_batch(&snapshot, "", &BTreeMap::new(), 10);
        assert_eq!(batch, "heap.usage value=0.82 10\n");
    }

    #[test]
    fn non_finite_gauge_is_dropped_from_the_batch() {
        let snapshot = vec![
            ("bad.gauge".to_string(), MetricValue::Gauge(f64::NAN)),
            ("good.count".to_string(), MetricValue::Counter(1)),
        ];
        let batch = encode_batch(&snapshot, "", &BTreeMap::new(), 10);
        assert_eq!(batch, "good.count count=1i 10\n");
    }

    #[test]
    fn meter_carries_the_rate_field_set() {
        let snapshot = vec![(
            "messages.rate".to_string(),
            MetricValue::Meter(MeterSnapshot {
                count: 10,
                m1_rate: 1.5,
                m5_rate: 0.5,
                m15_rate: 0.25,
                mean_rate: 2.0,
            }),
        )];
        let batch = encode_batch(&snapshot, "", &BTreeMap::new(), 7);
        assert_eq!(
            batch,
            "messages.rate count=10i,m1_rate=1.5,m5_rate=0.5,m15_rate=0.25,mean_rate=2 7\n"
        );
    }

    #[test]
    fn histogram_has_no_rate_fields_and_integer_bounds() {
        let snapshot = vec![(
            "payload.size".to_string(),
            MetricValue::Histogram(HistogramSnapshot {
                count: 4,
                min: 1,
                max: 9,
                mean: 4.5,
                stddev: 3.0,
                p50: 4.0,
                p75: 7.0,
                p95: 9.0,
                p98: 9.0,
                p99: 9.0,
                p999: 9.0,
            }),
        )];
        let batch = encode_batch(&snapshot, "", &BTreeMap::new(), 7);
        assert_eq!(
            batch,
            "payload.size count=4i,min=1i,max=9i,mean=4.5,stddev=3,p50=4,p75=7,p95=9,p98=9,p99=9,p999=9 7\n"
        );
        assert!(!batch.contains("m1_rate"));
    }

    #[test]
    fn timer_durations_convert_to_milliseconds() {
        let snapshot = vec![(
            "publish.latency".to_string(),
            MetricValue::Timer(TimerSnapshot {
                durations: HistogramSnapshot {
                    count: 2,
                    min: 100_000_000,
                    max: 300_000_000,
                    mean: 200_000_000.0,
                    stddev: 0.0,
                    p50: 200_000_000.0,
                    p75: 300_000_000.0,
                    p95: 300_000_000.0,
                    p98: 300_000_000.0,
                    p99: 300_000_000.0,
                    p999: 300_000_000.0,
                },
                rates: MeterSnapshot {
                    count: 2,
                    m1_rate: 0.0,
                    m5_rate: 0.0,
                    m15_rate: 0.0,
                    mean_rate: 1.0,
                },
            }),
        )];
        let batch = encode_batch(&snapshot, "", &BTreeMap::new(), 7);
        assert!(batch.starts_with("publish.latency count=2i,min=100,max=300,mean=200,"));
        assert!(batch.contains("p50=200,p75=300,"));
        assert!(batch.contains("m1_rate=0,m5_rate=0,m15_rate=0,mean_rate=1 7\n"));
    }

    #[test]
    fn prefix_applies_to_every_record() {
        let snapshot = vec![
            ("a.count".to_string(), MetricValue::Counter(1)),
            ("b.count".to_string(), MetricValue::Counter(2)),
        ];
        let batch = encode_batch(&snapshot, "node1.", &BTreeMap::new(), 5);
        assert_eq!(batch, "node1.a.count count=1i 5\nnode1.b.count count=2i 5\n");
    }

    #[test]
    fn empty_snapshot_encodes_to_an_empty_batch() {
        let batch = encode_batch(&[], "", &BTreeMap::new(), 5);
        assert!(batch.is_empty());
    }
}
