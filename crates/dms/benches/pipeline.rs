use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dms::{compute_ear, DmsConfig, DmsModule};
use landmark_source::scripted::{synthetic_eye, synthetic_face};
use landmark_source::EyeLandmarkSet;

fn bench_ear(c: &mut Criterion) {
    let eye = EyeLandmarkSet::try_from(synthetic_eye(0.28).as_slice()).unwrap();
    c.bench_function("compute_ear", |b| b.iter(|| compute_ear(black_box(&eye))));
}

fn bench_analyze(c: &mut Criterion) {
    let mut dms = DmsModule::new(DmsConfig::default()).unwrap();
    let open = synthetic_face(0.3);
    let closed = synthetic_face(0.1);

    c.bench_function("analyze_frame", |b| {
        let mut i = 0u32;
        b.iter(|| {
            i = i.wrapping_add(1);
            let face = if i % 40 < 20 { &open } else { &closed };
            dms.analyze(black_box(Some(face)))
        })
    });
}

criterion_group!(benches, bench_ear, bench_analyze);
criterion_main!(benches);
