use criterion::{criterion_group, criterion_main, Criterion};

use imgduel::render::{wrap_text, Color, FontFace, ReportRenderer, ReportSpec, ResultEntry, Surface};
use imgduel::ImageRef;

fn sample_image(w: u32, h: u32, color: Color) -> ImageRef {
    let s = Surface::new(w, h, color);
    ImageRef::from_bytes("image/png", &s.encode_png().unwrap())
}

fn bench_wrap_text(c: &mut Criterion) {
    let face = FontFace::new();
    let prompt = "a lighthouse keeper's cat painted in oils, dramatic storm light, \
                  towering waves, weathered stone, brass lantern fittings "
        .repeat(8);

    c.bench_function("wrap_text_long_prompt", |b| {
        b.iter(|| wrap_text(&prompt, 1432.0, |s| face.measure(s, 24.0)))
    });
}

fn bench_render_report(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let renderer = ReportRenderer::default();
    let spec = ReportSpec {
        prompt: "a lighthouse keeper's cat, oil on canvas".to_string(),
        references: vec![sample_image(64, 64, Color::PANEL_GREY)],
        left: ResultEntry {
            image: sample_image(512, 512, Color::ACCENT_RED),
            label: "NANO".to_string(),
            latency_ms: 820,
            accent: Color::ACCENT_RED,
        },
        right: ResultEntry {
            image: sample_image(512, 512, Color::ACCENT_BLUE),
            label: "PRO".to_string(),
            latency_ms: 1340,
            accent: Color::ACCENT_BLUE,
        },
    };

    c.bench_function("render_report", |b| {
        b.iter(|| rt.block_on(renderer.render_at(&spec, 1_000)).unwrap())
    });
}

criterion_group!(benches, bench_wrap_text, bench_render_report);
criterion_main!(benches);
