//! Benchmarks for webhook parsing and payload decoding

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lorasensor::{Decoder, Envelope, InterestFilter, PayloadFormat};

fn generate_payloads(count: usize) -> Vec<[u8; 9]> {
    (0..count)
        .map(|i| {
            let raw_t = (25_600 + i * 13) as u16;
            let [lo, hi] = raw_t.to_le_bytes();
            [0x01, lo, hi, (i % 200) as u8, 0, 0, 0, 0, (i % 256) as u8]
        })
        .collect()
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");

    let payloads = generate_payloads(1000);
    let decoder = Decoder::with_format(PayloadFormat::WithBattery);

    group.throughput(Throughput::Elements(1000));

    group.bench_function("decode_1000_payloads", |b| {
        b.iter(|| {
            for p in &payloads {
                black_box(decoder.decode_bytes(p).ok());
            }
        })
    });

    group.bench_function("decode_base64_1000_payloads", |b| {
        let encoded: Vec<String> = payloads
            .iter()
            .map(|p| {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD.encode(p)
            })
            .collect();
        b.iter(|| {
            for p in &encoded {
                black_box(decoder.decode(p).ok());
            }
        })
    });

    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");

    let v2 = serde_json::json!({ "dev_id": "risinghf-001", "port": 8, "payload_raw": "AQBkMg==" });
    let v3 = serde_json::json!({
        "end_device_ids": { "device_id": "risinghf-001" },
        "uplink_message": { "f_port": 8, "frm_payload": "AQBkMg==" }
    });
    let filter = InterestFilter::default();

    group.bench_function("classify_v2", |b| {
        b.iter(|| {
            let envelope = Envelope::parse(black_box(&v2));
            black_box(matches!(
                filter.classify(&envelope),
                lorasensor::Interest::Match { .. }
            ))
        })
    });

    group.bench_function("classify_v3", |b| {
        b.iter(|| {
            let envelope = Envelope::parse(black_box(&v3));
            black_box(matches!(
                filter.classify(&envelope),
                lorasensor::Interest::Match { .. }
            ))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decoding, bench_envelope);
criterion_main!(benches);
