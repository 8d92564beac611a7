//! The resampling record-source decorator: demultiplexing and address
//! handling over a scripted source.

use std::collections::VecDeque;

use seisflow_foundation::{Record, RecordSource, SampleBuffer};
use seisflow_resample::{ResampleStream, ResamplerConfig, StreamAddress};

struct ScriptedSource {
    records: VecDeque<Record>,
}

impl ScriptedSource {
    fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

impl RecordSource for ScriptedSource {
    fn next_record(&mut self) -> Option<Record> {
        self.records.pop_front()
    }
}

fn record(station: &str, start: f64, rate: f64, value: f64, len: usize) -> Record {
    Record::new(
        "GR",
        station,
        "",
        "BHZ",
        start,
        rate,
        SampleBuffer::Double(vec![value; len]),
    )
}

#[test]
fn each_stream_gets_its_own_state() {
    // Two interleaved stations at different rates, both brought to 25 Hz
    let source = ScriptedSource::new(vec![
        record("BFO", 0.0, 100.0, 1.0, 400),
        record("WET", 0.0, 50.0, 2.0, 200),
        record("BFO", 4.0, 100.0, 1.0, 400),
        record("WET", 4.0, 50.0, 2.0, 200),
    ]);

    let mut stream =
        ResampleStream::new(source, ResamplerConfig::with_target_rate(25.0)).unwrap();

    let mut by_station: std::collections::HashMap<String, usize> = Default::default();
    while let Some(out) = stream.next_record() {
        assert_eq!(out.sampling_rate, 25.0);
        if let SampleBuffer::Double(v) = &out.samples {
            let expected = if out.station == "BFO" { 1.0 } else { 2.0 };
            for s in v {
                assert!((s - expected).abs() < 0.05);
            }
        }
        *by_station.entry(out.station.clone()).or_default() += out.len();
    }

    assert_eq!(stream.stream_count(), 2);
    assert!(by_station["BFO"] > 0);
    assert!(by_station["WET"] > 0);
}

#[test]
fn exhausted_source_ends_the_stream() {
    let source = ScriptedSource::new(vec![record("BFO", 0.0, 100.0, 1.0, 400)]);
    let mut stream =
        ResampleStream::new(source, ResamplerConfig::with_target_rate(25.0)).unwrap();
    assert!(stream.next_record().is_some());
    assert!(stream.next_record().is_none());
    assert!(stream.next_record().is_none());
}

#[test]
fn records_that_produce_nothing_are_skipped_over() {
    // The first short record only fills the ring; next_record keeps
    // pulling until the second record yields output.
    let source = ScriptedSource::new(vec![
        record("BFO", 0.0, 100.0, 1.0, 40),
        record("BFO", 0.4, 100.0, 1.0, 400),
    ]);
    let mut stream =
        ResampleStream::new(source, ResamplerConfig::with_target_rate(25.0)).unwrap();
    let out = stream.next_record().unwrap();
    assert!((out.start_time - 0.4).abs() < 1e-9);
}

#[test]
fn opens_from_a_parsed_address() {
    let addr = StreamAddress::parse("slink/geofon.gfz:18000?rate=25").unwrap();
    let source = ScriptedSource::new(vec![record("BFO", 0.0, 100.0, 1.0, 400)]);
    let mut stream = ResampleStream::open(source, &addr);
    let out = stream.next_record().unwrap();
    assert_eq!(out.sampling_rate, 25.0);
}

#[test]
fn invalid_config_fails_at_construction() {
    let source = ScriptedSource::new(Vec::new());
    assert!(ResampleStream::new(source, ResamplerConfig::with_target_rate(-1.0)).is_err());
}
