use criterion::{criterion_group, criterion_main, Criterion};
use feedback_overlay::annotate::{
    CanvasCompositor, CompositorStyle, Rect, Region, RegionDraft, RegionId, RegionMode, Scene,
};

fn regions(count: u64) -> Vec<Region> {
    (0..count)
        .map(|i| Region {
            id: RegionId(i),
            bounds: Rect::new(
                (i % 10) as f64 * 120.0,
                (i / 10) as f64 * 90.0,
                100.0,
                70.0,
            ),
            mode: if i % 3 == 0 {
                RegionMode::Conceal
            } else {
                RegionMode::Reveal
            },
        })
        .collect()
}

fn bench_repaint(c: &mut Criterion) {
    let regions = regions(50);
    let mut compositor = CanvasCompositor::new((1280, 2400), CompositorStyle::default());
    let scene = Scene {
        active: Some(RegionDraft::new(
            Rect::new(300.0, 300.0, 400.0, 250.0),
            RegionMode::Reveal,
        )),
        ..Scene::committed(&regions)
    };
    c.bench_function("repaint_50_regions_1280x2400", |b| {
        b.iter(|| compositor.repaint(&scene))
    });
}

criterion_group!(benches, bench_repaint);
criterion_main!(benches);
