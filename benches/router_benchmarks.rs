use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use log_router::config::{default_rules, Rule};
use log_router::core::{
    LazyFormatter, LogContext, LogLevel, LogRecord, LoggerHooks, LoggerInstance, PrettyOptions,
    Result, Sink, WriteMeta,
};
use log_router::logger::Logger;
use log_router::routing::{resolve, Binding, BindingList};
use std::sync::Arc;

struct NullSink;

impl Sink for NullSink {
    fn write(&mut self, chunk: &str, _meta: &WriteMeta) -> Result<()> {
        black_box(chunk);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn null_logger(formatted: bool) -> Logger {
    let sink: Box<dyn Sink> = if formatted {
        Box::new(LazyFormatter::new(
            Box::new(NullSink),
            PrettyOptions::file_defaults().with_colorize(false).into_prettifier(),
        ))
    } else {
        Box::new(NullSink)
    };
    let mut bindings = BindingList::new();
    bindings.push(Binding::new(LogLevel::Info, "null", sink));
    let instance = Arc::new(LoggerInstance::new("bench", LoggerHooks::default()));
    Logger::new(instance, bindings)
}

// ============================================================================
// Rule resolution
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut rules = default_rules();
    for i in 0..20 {
        rules.push(Rule::new(format!("service-{}", i), LogLevel::Error, "file"));
    }

    let mut group = c.benchmark_group("resolve");
    group.bench_function("wildcard_only", |b| {
        b.iter(|| resolve(black_box(&rules), black_box("unlisted")))
    });
    group.bench_function("with_override", |b| {
        b.iter(|| resolve(black_box(&rules), black_box("service-7")))
    });
    group.finish();
}

// ============================================================================
// Wire serialization
// ============================================================================

fn bench_wire(c: &mut Criterion) {
    let instance = LoggerInstance::new("bench", LoggerHooks::default());
    let record = LogRecord::new("bench", LogLevel::Info)
        .with_fields(
            LogContext::new()
                .with_field("user_id", 12345i64)
                .with_field("action", "checkout")
                .with_field("duration_ms", 42.5),
        )
        .with_message("order placed");

    let mut group = c.benchmark_group("wire");
    group.throughput(Throughput::Elements(1));
    group.bench_function("to_wire", |b| {
        b.iter(|| {
            black_box(&record)
                .to_wire(instance.chindings(), instance.message_key())
                .unwrap()
        })
    });
    group.finish();
}

// ============================================================================
// Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let raw = null_logger(false);
    let pretty = null_logger(true);

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));
    group.bench_function("raw_sink", |b| b.iter(|| raw.info(black_box("request served"))));
    group.bench_function("formatted_sink", |b| {
        b.iter(|| pretty.info(black_box("request served")))
    });
    group.bench_function("filtered_out", |b| {
        b.iter(|| raw.trace(black_box("not routed")))
    });
    group.bench_function("with_fields", |b| {
        b.iter(|| {
            raw.info_with(
                LogContext::new().with_field("status", 200i64).with_field("path", "/orders"),
                black_box("request served"),
            )
        })
    });
    group.finish();
}

// ============================================================================
// Prettifier
// ============================================================================

fn bench_prettify(c: &mut Criterion) {
    let obj = LogContext::new()
        .with_field("level", "INFO")
        .with_field("time", "2024-10-17 09:30:00")
        .with_field("pid", 4242i64)
        .with_field("hostname", "bench-host")
        .with_field("name", "bench")
        .with_field("message", "request served")
        .with_field("status", 200i64);

    let multi_line = PrettyOptions::file_defaults().with_colorize(false);
    let single_line = multi_line.clone().with_single_line(true);

    let mut group = c.benchmark_group("prettify");
    group.bench_function("multi_line", |b| b.iter(|| multi_line.prettify(black_box(&obj))));
    group.bench_function("single_line", |b| b.iter(|| single_line.prettify(black_box(&obj))));
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_wire, bench_dispatch, bench_prettify);
criterion_main!(benches);
