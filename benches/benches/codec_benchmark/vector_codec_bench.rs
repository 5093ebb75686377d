use std::{hint::black_box, io::Cursor, time::Duration};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dolphindb::{
    model::ColumnData, read_value, table_from_raw_data, write_value, CodecConfig, DataType,
    RawColumn, Value, Vector, WireOrder,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const SYMBOLS: [&str; 6] = ["AAPL", "MSFT", "IBM", "GOOG", "AMZN", "TSLA"];

fn long_vector(
    rng: &mut SmallRng,
    rows: usize,
) -> Value {
    let data = (0..rows).map(|_| rng.gen()).collect();
    Vector::new(DataType::Long, ColumnData::Long(data)).unwrap().into()
}

fn trades_table(
    rng: &mut SmallRng,
    rows: usize,
) -> Value {
    let syms: Vec<&str> = (0..rows)
        .map(|_| SYMBOLS[rng.gen_range(0..SYMBOLS.len())])
        .collect();
    let prices: Vec<f64> = (0..rows).map(|_| rng.gen_range(10.0..500.0)).collect();
    let qty: Vec<i32> = (0..rows).map(|_| rng.gen_range(1..10_000)).collect();
    table_from_raw_data(
        &["sym", "price", "qty"],
        &[DataType::Symbol, DataType::Double, DataType::Int],
        vec![
            RawColumn::from(syms),
            RawColumn::from(prices),
            RawColumn::from(qty),
        ],
    )
    .unwrap()
    .into()
}

fn encoded(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, WireOrder::Little, &CodecConfig::default()).unwrap();
    buf
}

pub fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    let mut rng = SmallRng::seed_from_u64(42);
    let config = CodecConfig::default();

    for &rows in &[1_000usize, 100_000, 1_000_000] {
        for (kind, value) in [
            ("long", long_vector(&mut rng, rows)),
            ("table", trades_table(&mut rng, rows)),
        ] {
            let bytes = encoded(&value);
            group.throughput(Throughput::Bytes(bytes.len() as u64));

            group.bench_with_input(
                BenchmarkId::new(format!("encode/{kind}"), rows),
                &value,
                |b, value| {
                    let mut buf = Vec::with_capacity(bytes.len());
                    b.iter(|| {
                        buf.clear();
                        write_value(&mut buf, black_box(value), WireOrder::Little, &config)
                            .unwrap();
                    })
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("decode/{kind}"), rows),
                &bytes,
                |b, bytes| {
                    b.iter(|| {
                        read_value(
                            &mut Cursor::new(black_box(bytes)),
                            WireOrder::Little,
                            &config,
                        )
                        .unwrap()
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
