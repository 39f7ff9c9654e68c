use criterion::{Criterion, criterion_group, criterion_main};
use mcbootlib::{BootAttrs, HexFile, prepare};

#[allow(clippy::expect_used)]
fn bench_chunk_preparation(c: &mut Criterion) {
    let input_path = "tests/fixtures/flash.hex";
    let attrs = BootAttrs {
        max_packet_length: 256,
        write_size: 8,
        memory_start: 6144,
        memory_end: 174_080,
        ..BootAttrs::default()
    };

    // Record decoding and model insertion only
    c.bench_function("mcbootlib_add_ihex", |b| {
        let text = std::fs::read_to_string(input_path).expect("Failed to read hex file");

        b.iter(|| {
            let mut hexfile = HexFile::new();
            hexfile
                .add_ihex(std::hint::black_box(&text))
                .expect("Failed to decode hex file");
            std::hint::black_box(hexfile);
        });
    });

    // Full pipeline: read, decode, crop, retag, chunk
    c.bench_function("mcbootlib_prepare", |b| {
        b.iter(|| {
            let chunks = prepare(std::hint::black_box(input_path), &attrs)
                .expect("Failed to prepare chunks");
            std::hint::black_box(chunks);
        });
    });
}

criterion_group!(
    name = mcbootlib_benches;
    config = Criterion::default().sample_size(20);
    targets = bench_chunk_preparation
);
criterion_main!(mcbootlib_benches);
