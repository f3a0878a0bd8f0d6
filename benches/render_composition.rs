use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use exo_cuing::renderer::SkiaRenderer;
use exo_cuing::stimulus::{StimulusSizes, GREY};
use exo_cuing::timer::HighPrecisionTimer;
use exo_cuing::{CueLocation, Display, ScreenGeometry, StimulusCatalog, TargetLocation};

fn bench_render_display(c: &mut Criterion) {
    let (width, height) = (1920, 1080);
    let geometry = ScreenGeometry::new(width, height, 530.0, 570.0);
    let catalog = StimulusCatalog::build(&geometry, &StimulusSizes::default());
    let mut renderer = SkiaRenderer::new(width, height, GREY, &catalog).expect("renderer");
    let mut frame = vec![0u8; (width * height * 4) as usize];
    let mut timer = HighPrecisionTimer::new();

    let displays = [
        ("fixation", Display::Fixation),
        ("pre_cue", Display::PreCue),
        ("neutral_cue", Display::Cue(CueLocation::Neutral)),
        ("left_target", Display::Target(TargetLocation::Left)),
    ];

    let mut group = c.benchmark_group("render_display");
    for (name, display) in displays {
        group.bench_with_input(BenchmarkId::from_parameter(name), &display, |b, display| {
            b.iter(|| {
                renderer
                    .render_frame(
                        black_box(display.composition()),
                        &catalog,
                        &mut frame,
                        &mut timer,
                    )
                    .expect("render")
            })
        });
    }
    group.finish();
}

fn bench_catalog_build(c: &mut Criterion) {
    let geometry = ScreenGeometry::new(1920, 1080, 530.0, 570.0);
    c.bench_function("catalog_build", |b| {
        b.iter(|| StimulusCatalog::build(black_box(&geometry), &StimulusSizes::default()))
    });
}

criterion_group!(benches, bench_render_display, bench_catalog_build);
criterion_main!(benches);
