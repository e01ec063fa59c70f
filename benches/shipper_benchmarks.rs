//! Criterion benchmarks for rust_log_shipper

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_log_shipper::core::{Batch, BatchBuffer, Payload};
use rust_log_shipper::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Accepts every batch without doing I/O
struct NullTransport;

impl Transport for NullTransport {
    fn send(&mut self, _payload: &Payload, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Swallows console output
struct NullSink;

impl EventSink for NullSink {
    fn write(&self, event: &Event) -> Result<()> {
        black_box(event);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn identity() -> SourceIdentity {
    SourceIdentity {
        source_id: Some("bench-host".to_string()),
        app_id: Some("bench".to_string()),
        service_name: Some("criterion".to_string()),
    }
}

fn sample_batch(size: usize) -> Batch {
    let identity = identity();
    (0..size)
        .map(|i| {
            Event::new(LogLevel::Info, format!("request {} served", i), &identity).with_attributes(
                Attributes::new()
                    .with_field("status", 200)
                    .with_field("elapsed_ms", i as i64),
            )
        })
        .collect::<Vec<_>>()
        .into()
}

// ============================================================================
// Submission Benchmarks
// ============================================================================

fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit");
    group.throughput(Throughput::Elements(1));

    let shipper = Shipper::builder()
        .endpoint_url("http://127.0.0.1:9/ingest")
        .console(false)
        .console_sink(Arc::new(NullSink))
        .max_buffer_size(10_000)
        .build_with_transport(Box::new(NullTransport));

    group.bench_function("info", |b| {
        b.iter(|| shipper.info(black_box("Info message")));
    });

    group.bench_function("with_attributes", |b| {
        b.iter(|| {
            shipper.log_with_attributes(
                LogLevel::Warn,
                black_box("Slow query"),
                Attributes::new().with_field("table", "orders").with_field("ms", 812),
            )
        });
    });

    let disabled = Shipper::builder()
        .endpoint_url("")
        .console_sink(Arc::new(NullSink))
        .build();

    group.bench_function("console_only", |b| {
        b.iter(|| disabled.info(black_box("Console message")));
    });

    group.finish();
}

// ============================================================================
// Buffer Benchmarks
// ============================================================================

fn bench_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer");
    let identity = identity();

    for size in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("fill_and_drain", size), &size, |b, &size| {
            let (buffer, _flush_rx) = BatchBuffer::new(size, OverflowPolicy::TriggerOnly);
            b.iter(|| {
                for _ in 0..size {
                    buffer.add(Event::new(LogLevel::Debug, "payload", &identity));
                }
                black_box(buffer.drain())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Encoding Benchmarks
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for size in [100usize, 1_000] {
        let batch = sample_batch(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("gzip", size), &batch, |b, batch| {
            b.iter(|| black_box(Payload::encode(batch, Compression::Gzip)))
        });

        group.bench_with_input(BenchmarkId::new("identity", size), &batch, |b, batch| {
            b.iter(|| black_box(Payload::encode(batch, Compression::None)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_submit, bench_buffer, bench_encode);
criterion_main!(benches);
