// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for payload normalisation and base64 transport
// encoding in the dazzle-client crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use dazzle_client::encoding::{Payload, encode_base64, text_to_bytes};

/// A shipping label with an embedded 8-bit graphic field, roughly the size of
/// what browsers send in practice.
fn sample_label() -> String {
    let mut zpl = String::from("^XA^FO50,50^A0N,40,40^FDShip to: Example Ltd^FS^FO50,120^GFA,");
    zpl.extend((0..4096u32).map(|i| char::from((i % 256) as u8)));
    zpl.push_str("^FS^XZ");
    zpl
}

fn bench_text_to_bytes(c: &mut Criterion) {
    let label = sample_label();
    c.bench_function("text_to_bytes (4 KiB label)", |b| {
        b.iter(|| text_to_bytes(black_box(&label)))
    });
}

fn bench_base64(c: &mut Criterion) {
    let bytes = text_to_bytes(&sample_label());
    c.bench_function("encode_base64 (4 KiB label)", |b| {
        b.iter(|| encode_base64(black_box(&bytes)))
    });
}

fn bench_payload_round(c: &mut Criterion) {
    let payload = Payload::from(sample_label());
    c.bench_function("Payload::to_base64 (text)", |b| {
        b.iter(|| black_box(&payload).to_base64())
    });
}

criterion_group!(benches, bench_text_to_bytes, bench_base64, bench_payload_round);
criterion_main!(benches);
