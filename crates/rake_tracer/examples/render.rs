//! Headless consumer demo: trace the two-sphere world and export a PNG.
//!
//! Run with `cargo run --release --example render`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rake_math::{Color, Point3, UVec2};
use rake_tracer::{export_png, Lambertian, Metal, Sphere, Tracer, World};

fn two_sphere_world() -> Arc<World> {
    let mut world = World::new("World");
    world.camera_focus_distance = 1.0;

    world.objects.add(Arc::new(Sphere::new(
        Point3::new(0.0, 0.0, -1.0),
        0.5,
        Arc::new(Lambertian::new(Color::new(0.7, 0.3, 0.3))),
    )));
    world.objects.add(Arc::new(Sphere::new(
        Point3::new(1.1, 0.0, -1.0),
        0.5,
        Arc::new(Metal::new(Color::new(0.8, 0.8, 0.9), 0.05)),
    )));
    world.objects.add(Arc::new(Sphere::new(
        Point3::new(0.0, -100.5, -1.0),
        100.0,
        Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.0))),
    )));

    Arc::new(world)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let size = UVec2::new(800, 450);
    let samples_per_pixel = 100;

    let mut tracer = Tracer::new();
    if !tracer.start_trace(size, samples_per_pixel, two_sphere_world()) {
        anyhow::bail!("tracer refused the trace");
    }

    // Poll at a frame-ish cadence, the way the viewport consumer would.
    let mut pixels = Vec::new();
    while tracer.is_running() {
        tracer.update();
        if tracer.update_pixels(&mut pixels) {
            let seconds = tracer.elapsed_time().as_secs_f64();
            let rays_per_second = tracer.raycast_count() as f64 / seconds.max(1e-6);
            log::info!(
                "progress: {} / {samples_per_pixel} samples, {:.2}M rays/s",
                tracer.completed_samples(),
                rays_per_second / 1e6,
            );
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    tracer.update();
    tracer.update_pixels(&mut pixels);

    export_png("render.png".into(), size, pixels)
        .join()
        .expect("export worker panicked")?;

    Ok(())
}
