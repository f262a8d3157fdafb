//! Stream Aggregator
//!
//! Folds the realtime feed of one monitor into samples. Only the first
//! realtime update and the first device state batch count; repeats are
//! dropped. Once both have been seen the aggregator asks the feed to stop.
//!
//! # States
//!
//! ```text
//! NotStarted --first variant--> Collecting --second variant--> Done
//! ```

use std::collections::HashSet;
use std::ops::ControlFlow;

use super::catalog::DeviceCatalog;
use super::metrics::{Descriptors, Sample, SampleSink};
use super::model::{DeviceStateBatch, RealtimeUpdate, StreamMessage};

/// Progress of an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// Neither variant seen yet.
    NotStarted,
    /// Exactly one variant seen.
    Collecting,
    /// Both variants seen; the feed should stop.
    Done,
}

/// Aggregates one monitor's feed for one collection.
#[derive(Debug)]
pub struct StreamAggregator<'a> {
    descs: &'static Descriptors,
    catalog: &'a DeviceCatalog,
    got_realtime: bool,
    got_states: bool,
    seen_watts: HashSet<String>,
}

impl<'a> StreamAggregator<'a> {
    /// Create an aggregator labelling devices from `catalog`.
    #[must_use]
    pub fn new(descs: &'static Descriptors, catalog: &'a DeviceCatalog) -> Self {
        Self {
            descs,
            catalog,
            got_realtime: false,
            got_states: false,
            seen_watts: HashSet::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AggregatorState {
        match (self.got_realtime, self.got_states) {
            (false, false) => AggregatorState::NotStarted,
            (true, true) => AggregatorState::Done,
            _ => AggregatorState::Collecting,
        }
    }

    /// Whether a realtime update reported power for this device.
    #[must_use]
    pub fn saw_watts(&self, device_id: &str) -> bool {
        self.seen_watts.contains(device_id)
    }

    /// Feed one message. Returns `Break` once both variants have been seen.
    pub fn handle(&mut self, msg: StreamMessage, sink: &mut SampleSink) -> ControlFlow<()> {
        match msg {
            StreamMessage::Realtime(update) => {
                if !self.got_realtime {
                    self.on_realtime(&update, sink);
                    self.got_realtime = true;
                }
            }
            StreamMessage::DeviceStates(batch) => {
                if !self.got_states {
                    self.on_device_states(&batch, sink);
                    self.got_states = true;
                }
            }
        }

        if self.state() == AggregatorState::Done {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn on_realtime(&mut self, update: &RealtimeUpdate, sink: &mut SampleSink) {
        for reading in &update.devices {
            sink.push(Sample::new(
                &self.descs.device_watts,
                reading.watts,
                self.catalog.device_labels(&reading.device_id),
            ));
            self.seen_watts.insert(reading.device_id.clone());
        }
        for (channel, volts) in update.voltage.iter().enumerate() {
            sink.push(Sample::new(
                &self.descs.monitor_volts,
                *volts,
                vec![channel.to_string()],
            ));
        }
        sink.push(Sample::unlabeled(&self.descs.monitor_watts, update.watts));
        sink.push(Sample::unlabeled(&self.descs.monitor_hz, update.hz));
    }

    fn on_device_states(&self, batch: &DeviceStateBatch, sink: &mut SampleSink) {
        for entry in &batch.states {
            let labels = self.catalog.device_labels(&entry.device_id);
            sink.push(Sample::new(
                &self.descs.device_active,
                entry.active_value(),
                labels.clone(),
            ));
            sink.push(Sample::new(
                &self.descs.device_online,
                entry.online_value(),
                labels,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::domain::metrics::DESCRIPTORS;
    use crate::domain::model::{Device, DeviceReading, DeviceState};

    fn catalog() -> DeviceCatalog {
        DeviceCatalog::new(vec![Device::new("d1", "Fridge"), Device::new("d2", "Oven")])
    }

    fn realtime(readings: &[(&str, f64)]) -> StreamMessage {
        StreamMessage::Realtime(RealtimeUpdate {
            watts: 812.0,
            hz: 60.01,
            voltage: vec![120.5, 119.8],
            devices: readings
                .iter()
                .map(|(id, w)| DeviceReading::new(*id, *w))
                .collect(),
        })
    }

    fn states() -> StreamMessage {
        StreamMessage::DeviceStates(DeviceStateBatch {
            states: vec![
                DeviceState::new("d1", "active", "online"),
                DeviceState::new("d2", "inactive", "offline"),
            ],
        })
    }

    fn values(sink: &SampleSink, name: &str) -> Vec<(String, f64)> {
        sink.samples()
            .iter()
            .filter(|s| s.name() == name)
            .map(|s| (s.label_values.first().cloned().unwrap_or_default(), s.value))
            .collect()
    }

    #[test]
    fn realtime_update_emits_monitor_and_device_gauges() {
        let catalog = catalog();
        let mut agg = StreamAggregator::new(&DESCRIPTORS, &catalog);
        let mut sink = SampleSink::new();

        let flow = agg.handle(realtime(&[("d1", 25.5)]), &mut sink);

        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(agg.state(), AggregatorState::Collecting);
        assert_eq!(values(&sink, "sense_device_watts"), vec![("d1".to_string(), 25.5)]);
        assert_eq!(
            values(&sink, "sense_monitor_volts"),
            vec![("0".to_string(), 120.5), ("1".to_string(), 119.8)]
        );
        assert_eq!(values(&sink, "sense_monitor_watts").len(), 1);
        assert_eq!(values(&sink, "sense_monitor_hz")[0].1, 60.01);
        assert!(agg.saw_watts("d1"));
        assert!(!agg.saw_watts("d2"));
    }

    #[test]
    fn device_states_map_to_booleans() {
        let catalog = catalog();
        let mut agg = StreamAggregator::new(&DESCRIPTORS, &catalog);
        let mut sink = SampleSink::new();

        let _ = agg.handle(states(), &mut sink);

        assert_eq!(
            values(&sink, "sense_device_active"),
            vec![("d1".to_string(), 1.0), ("d2".to_string(), 0.0)]
        );
        assert_eq!(
            values(&sink, "sense_device_online"),
            vec![("d1".to_string(), 1.0), ("d2".to_string(), 0.0)]
        );
        let active = &sink.samples()[0];
        assert_eq!(active.label("name"), Some("Fridge"));
    }

    #[test]
    fn both_variants_request_stop() {
        let catalog = catalog();
        let mut agg = StreamAggregator::new(&DESCRIPTORS, &catalog);
        let mut sink = SampleSink::new();
        assert_eq!(agg.state(), AggregatorState::NotStarted);

        assert_eq!(agg.handle(states(), &mut sink), ControlFlow::Continue(()));
        assert_eq!(
            agg.handle(realtime(&[("d1", 1.0)]), &mut sink),
            ControlFlow::Break(())
        );
        assert_eq!(agg.state(), AggregatorState::Done);
    }

    #[test]
    fn unknown_device_has_empty_metadata() {
        let catalog = catalog();
        let mut agg = StreamAggregator::new(&DESCRIPTORS, &catalog);
        let mut sink = SampleSink::new();

        let _ = agg.handle(realtime(&[("ghost", 3.0)]), &mut sink);

        let sample = &sink.samples()[0];
        assert_eq!(sample.label("device_id"), Some("ghost"));
        assert_eq!(sample.label("name"), Some(""));
        assert_eq!(sample.label("model"), Some(""));
    }

    #[test]
    fn repeated_states_are_ignored() {
        let catalog = catalog();
        let mut agg = StreamAggregator::new(&DESCRIPTORS, &catalog);
        let mut sink = SampleSink::new();

        let _ = agg.handle(states(), &mut sink);
        let after_first = sink.len();
        let _ = agg.handle(states(), &mut sink);

        assert_eq!(sink.len(), after_first);
        assert_eq!(agg.state(), AggregatorState::Collecting);
    }

    proptest! {
        #[test]
        fn repeated_realtime_updates_are_idempotent(
            first in prop::collection::vec(0.0f64..5000.0, 0..6),
            repeats in prop::collection::vec(prop::collection::vec(0.0f64..5000.0, 0..6), 1..4),
        ) {
            let catalog = catalog();
            let to_msg = |watts: &[f64]| {
                let readings: Vec<(String, f64)> = watts
                    .iter()
                    .enumerate()
                    .map(|(i, w)| (format!("d{i}"), *w))
                    .collect();
                let refs: Vec<(&str, f64)> =
                    readings.iter().map(|(id, w)| (id.as_str(), *w)).collect();
                realtime(&refs)
            };

            let mut once = SampleSink::new();
            let _ = StreamAggregator::new(&DESCRIPTORS, &catalog).handle(to_msg(&first), &mut once);

            let mut many = SampleSink::new();
            let mut agg = StreamAggregator::new(&DESCRIPTORS, &catalog);
            let _ = agg.handle(to_msg(&first), &mut many);
            for watts in &repeats {
                let _ = agg.handle(to_msg(watts), &mut many);
            }

            prop_assert_eq!(once.samples(), many.samples());
        }
    }
}
