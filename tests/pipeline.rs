//! End-to-end tests: bytes written into a link come out as records.

use aerolink::{Aerolink, LinkConfig, LinkError, SerialConfig, StreamPump, UpdateRate};
use futures::StreamExt;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test(start_paused = true)]
async fn records_flow_from_reader_to_subscriber() {
    init_tracing();

    let (mut writer, reader) = tokio::io::duplex(64);
    let connection = Aerolink::from_reader(reader, LinkConfig::default()).expect("open link");
    let mut records = connection.subscribe(UpdateRate::Native);

    tokio::spawn(async move {
        for part in [&b"100,200,"[..], b"30,40\r", b"\n101,201,31,41\n", b"102,202,32,42\r\n"] {
            writer.write_all(part).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let mut altitudes = Vec::new();
    for _ in 0..3 {
        altitudes.push(records.next().await.expect("record").altitude());
    }
    assert_eq!(altitudes, vec![100.0, 101.0, 102.0]);
    assert_eq!(connection.latest().map(|r| r.roll()), Some(42.0));
}

#[tokio::test(start_paused = true)]
async fn hostile_input_never_produces_bad_records() {
    init_tracing();

    let mut hostile = Vec::new();
    hostile.extend_from_slice(b"1,2,3,4\n");
    hostile.extend_from_slice(b"\x1b[2J\x1b[H\x00\x07,1,2,3\n");
    hostile.extend_from_slice(b"1,2,3,4\nFAKE LOG ENTRY\n");
    hostile.extend_from_slice(b"NaN,1,2,3\n");
    hostile.extend_from_slice(b"1e309,1,2,3\n");
    hostile.extend_from_slice(b"1,2,3,4,5\n");
    hostile.extend_from_slice(b"1,2,3,\n");
    hostile.extend_from_slice(&vec![b'A'; 4000]);
    hostile.extend_from_slice(b"\n");
    hostile.extend_from_slice(b"5,6,7,8\n");

    let config = LinkConfig { pump: aerolink::PumpConfig { backoff_ms: 1, ..Default::default() }, ..Default::default() };
    let cancel = CancellationToken::new();
    let pump = StreamPump::new(aerolink::ReaderSource::new(std::io::Cursor::new(hostile)), config.pump);
    let stream = pump.into_stream(cancel.clone());

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        canceller.cancel();
    });

    let records: Vec<_> = stream.collect().await;
    let values: Vec<[f64; 4]> = records.iter().map(|r| r.values()).collect();
    assert_eq!(values, vec![[1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]);
    assert!(records.iter().all(|r| r.values().iter().all(|v| v.is_finite())));
}

#[tokio::test(start_paused = true)]
async fn simulated_link_feeds_throttled_subscriber() {
    init_tracing();

    let connection = Aerolink::simulate(LinkConfig::default(), 9).expect("open simulated link");
    let records: Vec<_> = connection.subscribe(UpdateRate::Max(1)).take(3).collect().await;

    assert_eq!(records.len(), 3);
    for record in &records {
        assert!((10_000.0..=10_100.0).contains(&record.altitude()));
    }
    assert!(connection.shutdown().await.expect("clean shutdown") >= 3);
}

#[test]
fn bad_device_fails_before_anything_starts() {
    let config = LinkConfig {
        serial: SerialConfig { device: "/dev/ttyUSB0\r\nroot:x:0:0".to_string(), baud_rate: 9600 },
        ..LinkConfig::default()
    };

    // No runtime is needed: validation happens before the pump is spawned.
    let err = Aerolink::from_reader(tokio::io::empty(), config)
        .err()
        .expect("invalid device must be rejected");

    assert!(matches!(err, LinkError::InvalidDeviceIdentifier { .. }));
    assert!(!err.to_string().chars().any(char::is_control));
}
