use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qrcast_core::{
    codec::BarcodeCodec,
    decoder::{decode_armored, decode_frame_from_bytes},
    encoder::FrameBuilder,
    raster::RasterCodec,
};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for size in [64, 128, 256, 512] {
        let payload_bytes = Bytes::from(vec![0x42u8; size]);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                FrameBuilder::new(1)
                    .payload(payload_bytes.clone())
                    .build_armored()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [64, 128, 256, 512] {
        let encoded = FrameBuilder::new(1)
            .payload(Bytes::from(vec![0x42u8; size]))
            .build()
            .unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, data| {
            b.iter(|| decode_frame_from_bytes(black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_raster(c: &mut Criterion) {
    let mut group = c.benchmark_group("raster");
    let codec = RasterCodec::default();

    let armored = FrameBuilder::new(1)
        .payload(Bytes::from(vec![0x42u8; 512]))
        .build_armored()
        .unwrap();
    let image = codec.render(&armored).unwrap();

    group.throughput(Throughput::Bytes(armored.len() as u64));
    group.bench_function("render_512", |b| {
        b.iter(|| codec.render(black_box(&armored)).unwrap());
    });
    group.bench_function("scan_512", |b| {
        b.iter(|| {
            let symbols = codec.scan(black_box(&image)).unwrap();
            decode_armored(&symbols[0]).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_raster);
criterion_main!(benches);
