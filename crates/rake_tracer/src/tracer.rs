//! Progressive multithreaded tracer.
//!
//! `start_trace` splits the image into horizontal bands and seeds a task
//! queue with one entry per band at sample 0. Worker threads pop tasks,
//! shade their band for that one sample, fold the result into the band's
//! running sum, and re-enqueue the band at the next sample index. The
//! foreground consumer polls `update_pixels` for averaged snapshots while
//! the image refines.
//!
//! Bands are disjoint and a band's task exists at most once at a time, so
//! each band has a single writer for its whole lifetime. Different bands can
//! momentarily hold different sample counts; a snapshot mixes them, which is
//! an accepted property of the progressive display.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rake_math::{Color, Ray, UVec2};

use crate::bvh::BvhNode;
use crate::camera::Camera;
use crate::hittable::{HitRecord, Hittable};
use crate::random::random_double;
use crate::world::World;

/// Rows per task band.
const LINES_PER_TASK: u32 = 10;

/// Recursion limit for `cast_ray`.
const MAX_DEPTH: u32 = 50;

/// Minimum number of newly finished band-samples before `update_pixels`
/// hands out a fresh snapshot.
const SNAPSHOT_INTERVAL: u64 = 100;

/// Pack a band task into a queue word: low 16 bits y_min, next 16 bits
/// y_max, high 32 bits the sample index.
fn pack_task(y_min: u16, y_max: u16, sample: u32) -> u64 {
    u64::from(y_min) | (u64::from(y_max) << 16) | (u64::from(sample) << 32)
}

fn unpack_task(task: u64) -> (u32, u32, u32) {
    (
        (task & 0xffff) as u32,
        ((task >> 16) & 0xffff) as u32,
        (task >> 32) as u32,
    )
}

/// Start/stop wall-clock timer for the render readout.
#[derive(Debug, Default)]
struct Stopwatch {
    started: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    fn start(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
    }

    fn elapsed(&self) -> Duration {
        match self.started {
            Some(started) => self.accumulated + started.elapsed(),
            None => self.accumulated,
        }
    }
}

/// Accumulation state for one band of rows.
struct BandPixels {
    /// Sum of all completed samples, per pixel
    sum: Vec<Color>,
    /// `sum` scaled by 1/samples, refreshed after every merge; this is what
    /// the consumer copies
    avg: Vec<Color>,
}

struct Band {
    y_min: u32,
    y_max: u32,
    pixels: Mutex<BandPixels>,
}

/// Per-trace progress counters, shared by the workers and the consumer.
struct TraceStats {
    /// One increment per finished band-sample task
    completed_samples: AtomicU64,
    /// Rays cast since the trace started
    total_raycasts: AtomicU64,
}

/// Everything a worker needs to shade tasks for one trace. Workers clone
/// the `Arc` when they pick up a task, so releasing the tracer's reference
/// never invalidates in-flight work.
struct TraceJob {
    width: u32,
    height: u32,
    samples_per_pixel: u32,
    camera: Camera,
    world: Arc<World>,
    bvh: Arc<BvhNode>,
    bands: Arc<Vec<Band>>,
    stats: Arc<TraceStats>,
}

/// Consumer-side view of the active (or just finished) trace. Outlives the
/// job so late `update_pixels` calls can still copy the final image.
struct Frame {
    width: u32,
    height: u32,
    bands: Arc<Vec<Band>>,
    stats: Arc<TraceStats>,
}

/// State shared between the consumer thread and the worker pool.
struct Shared {
    /// Worker pool alive
    running: AtomicBool,
    /// A trace is in progress
    rendering: AtomicBool,
    queue: Mutex<TaskQueue>,
    /// Workers park here while the queue is empty
    tasks_cond: Condvar,
    /// Signals `Tracer::new` once every worker is parked
    started_cond: Condvar,
    /// Active trace, dropped by `update` once the trace ends
    job: RwLock<Option<Arc<TraceJob>>>,
}

struct TaskQueue {
    tasks: VecDeque<u64>,
    /// Number of workers currently parked on `tasks_cond`
    waiting: usize,
}

/// Progressive path tracer with a fixed worker pool.
///
/// The consumer drives it from a single thread: `start_trace`, then
/// `update` + `update_pixels` once per frame, and `cancel_trace` to stop
/// early. Dropping the tracer shuts the pool down.
pub struct Tracer {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    frame: Option<Frame>,
    task_group_count: u32,
    needed_samples: u64,
    last_updated_sample: u64,
    render_time: Stopwatch,
}

impl Tracer {
    /// Spawn the worker pool and wait until every worker is parked on the
    /// task queue.
    pub fn new() -> Self {
        let worker_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .saturating_sub(2)
            .max(1);

        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            rendering: AtomicBool::new(false),
            queue: Mutex::new(TaskQueue {
                tasks: VecDeque::new(),
                waiting: 0,
            }),
            tasks_cond: Condvar::new(),
            started_cond: Condvar::new(),
            job: RwLock::new(None),
        });

        log::info!("starting {worker_count} render workers");
        let workers = (0..worker_count)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || worker_loop(&shared))
            })
            .collect();

        {
            let mut queue = shared.queue.lock().unwrap();
            while queue.waiting < worker_count {
                queue = shared.started_cond.wait(queue).unwrap();
            }
        }

        Self {
            shared,
            workers,
            frame: None,
            task_group_count: 0,
            needed_samples: 0,
            last_updated_sample: 0,
            render_time: Stopwatch::default(),
        }
    }

    /// Begin a progressive trace.
    ///
    /// Returns `false`, leaving any active trace untouched, if a trace is
    /// already running, the requested image is degenerate, or the world's
    /// BVH cannot be built.
    pub fn start_trace(&mut self, image_size: UVec2, samples_per_pixel: u32, world: Arc<World>) -> bool {
        if self.shared.rendering.load(Ordering::Acquire) {
            log::warn!("start_trace called while a trace is running");
            return false;
        }
        if image_size.x == 0 || image_size.y == 0 || samples_per_pixel == 0 {
            log::warn!(
                "start_trace rejected: {}x{} at {samples_per_pixel} spp",
                image_size.x,
                image_size.y
            );
            return false;
        }
        // Band rows are packed into 16 bits per task word.
        if image_size.y > u32::from(u16::MAX) {
            log::warn!("start_trace rejected: image height {} too large", image_size.y);
            return false;
        }

        let bvh_start = Instant::now();
        let bvh = match world.construct_bvh() {
            Ok(bvh) => bvh,
            Err(err) => {
                log::error!("cannot start trace on world '{}': {err}", world.name);
                return false;
            }
        };
        log::info!("world '{}' BVH ready in {:.2?}", world.name, bvh_start.elapsed());

        let camera = Camera::new(
            world.camera_pos,
            world.camera_target,
            world.vertical_fov,
            f64::from(image_size.x) / f64::from(image_size.y),
            world.camera_aperture,
            world.camera_focus_distance,
        );

        // One band of LINES_PER_TASK rows per task; the last band may be
        // shorter.
        let mut bands = Vec::new();
        let mut y = 0;
        while y < image_size.y {
            let y_max = (y + LINES_PER_TASK).min(image_size.y);
            let pixel_count = (image_size.x * (y_max - y)) as usize;
            bands.push(Band {
                y_min: y,
                y_max,
                pixels: Mutex::new(BandPixels {
                    sum: vec![Color::ZERO; pixel_count],
                    avg: vec![Color::ZERO; pixel_count],
                }),
            });
            y = y_max;
        }
        let bands = Arc::new(bands);
        let stats = Arc::new(TraceStats {
            completed_samples: AtomicU64::new(0),
            total_raycasts: AtomicU64::new(0),
        });

        self.task_group_count = bands.len() as u32;
        self.needed_samples = u64::from(self.task_group_count) * u64::from(samples_per_pixel);
        self.last_updated_sample = 0;
        self.frame = Some(Frame {
            width: image_size.x,
            height: image_size.y,
            bands: Arc::clone(&bands),
            stats: Arc::clone(&stats),
        });

        log::info!(
            "starting trace: {}x{}, {samples_per_pixel} spp, {} bands",
            image_size.x,
            image_size.y,
            self.task_group_count
        );

        *self.shared.job.write().unwrap() = Some(Arc::new(TraceJob {
            width: image_size.x,
            height: image_size.y,
            samples_per_pixel,
            camera,
            world,
            bvh,
            bands: Arc::clone(&bands),
            stats,
        }));

        self.render_time.start();
        self.shared.rendering.store(true, Ordering::Release);

        let mut queue = self.shared.queue.lock().unwrap();
        for band in bands.iter() {
            queue.tasks.push_back(pack_task(band.y_min as u16, band.y_max as u16, 0));
        }
        self.shared.tasks_cond.notify_all();

        true
    }

    /// Cancel the active trace.
    ///
    /// Queued tasks are dropped immediately; workers already shading a band
    /// finish that band's sample and stop. Calling this twice in a row is a
    /// no-op on the second call.
    pub fn cancel_trace(&mut self) -> bool {
        {
            let mut queue = self.shared.queue.lock().unwrap();
            self.shared.rendering.store(false, Ordering::Release);
            queue.tasks.clear();
        }

        if self.render_time.started.is_some() {
            self.render_time.stop();
            log::info!("trace cancelled after {:.2?}", self.render_time.elapsed());
        }

        true
    }

    /// Per-frame housekeeping: notices a finished trace, stops the clock,
    /// and releases the scene references.
    pub fn update(&mut self) {
        if self.shared.rendering.load(Ordering::Acquire) {
            let completed = self
                .frame
                .as_ref()
                .map_or(0, |frame| frame.stats.completed_samples.load(Ordering::Relaxed));
            if completed == self.needed_samples {
                self.shared.rendering.store(false, Ordering::Release);
                self.render_time.stop();
                log::info!("trace completed in {:.2?}", self.render_time.elapsed());
            }
        }

        if !self.shared.rendering.load(Ordering::Acquire) {
            // Release the world/BVH refs once the trace has ended. Workers
            // still finishing a band hold their own reference.
            let mut job = self.shared.job.write().unwrap();
            if job.is_some() {
                *job = None;
            }
        }
    }

    /// Copy the averaged image into `out` if enough new samples have landed
    /// since the last copy (or the trace just finished). Returns whether
    /// `out` was refreshed; otherwise `out` is untouched.
    pub fn update_pixels(&mut self, out: &mut Vec<Color>) -> bool {
        let Some(frame) = &self.frame else {
            return false;
        };

        let completed = frame.stats.completed_samples.load(Ordering::Relaxed);
        let fresh = completed - self.last_updated_sample;
        if fresh == 0 {
            return false;
        }
        let finished = completed == self.needed_samples;
        if fresh < SNAPSHOT_INTERVAL && !finished {
            return false;
        }
        self.last_updated_sample = completed;

        out.clear();
        out.resize((frame.width * frame.height) as usize, Color::ZERO);
        for band in frame.bands.iter() {
            let start = (band.y_min * frame.width) as usize;
            let pixels = band.pixels.lock().unwrap();
            out[start..start + pixels.avg.len()].copy_from_slice(&pixels.avg);
        }

        true
    }

    /// Whether a trace is in progress.
    pub fn is_running(&self) -> bool {
        self.shared.rendering.load(Ordering::Acquire)
    }

    /// Wall-clock time of the current or most recent trace.
    pub fn elapsed_time(&self) -> Duration {
        self.render_time.elapsed()
    }

    /// Samples completed by every band so far (the floor across bands).
    pub fn completed_samples(&self) -> u32 {
        match &self.frame {
            Some(frame) if self.task_group_count > 0 => {
                (frame.stats.completed_samples.load(Ordering::Relaxed)
                    / u64::from(self.task_group_count)) as u32
            }
            _ => 0,
        }
    }

    /// Total rays cast by the current or most recent trace.
    pub fn raycast_count(&self) -> u64 {
        self.frame
            .as_ref()
            .map_or(0, |frame| frame.stats.total_raycasts.load(Ordering::Relaxed))
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        {
            let mut queue = self.shared.queue.lock().unwrap();
            self.shared.running.store(false, Ordering::Release);
            queue.tasks.clear();
            self.shared.tasks_cond.notify_all();
        }

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        log::info!("render workers stopped");
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let task = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if let Some(task) = queue.tasks.pop_front() {
                    break task;
                }
                if !shared.running.load(Ordering::Acquire) {
                    return;
                }
                queue.waiting += 1;
                shared.started_cond.notify_all();
                queue = shared.tasks_cond.wait(queue).unwrap();
                queue.waiting -= 1;
            }
        };

        run_task(shared, task);
    }
}

/// Shade one band for one sample and fold it into the band's accumulators.
fn run_task(shared: &Shared, task: u64) {
    let Some(job) = shared.job.read().unwrap().clone() else {
        // The trace ended while this task sat in the queue.
        return;
    };

    let (y_min, y_max, sample) = unpack_task(task);
    let band_index = (y_min / LINES_PER_TASK) as usize;
    let width = job.width as usize;

    // Shade into a local scratch buffer so no lock is held while tracing.
    let mut local = vec![Color::ZERO; width * (y_max - y_min) as usize];
    let mut raycasts = 0u64;

    // Clamped so 1-pixel-wide or -tall images still map to finite viewport
    // coordinates.
    let w_denom = f64::from((job.width - 1).max(1));
    let h_denom = f64::from((job.height - 1).max(1));

    for y in y_min..y_max {
        for x in 0..job.width {
            let s = (f64::from(x) + random_double()) / w_denom;
            // Flip so image space runs top-down while camera space runs
            // bottom-up.
            let t = 1.0 - (f64::from(y) + random_double()) / h_denom;
            let ray = job.camera.get_ray(s, t);
            let offset = ((y - y_min) as usize) * width + x as usize;
            local[offset] += cast_ray(&ray, &job.world, &job.bvh, &mut raycasts, 0);
        }
    }

    let avg_factor = 1.0 / (sample + 1) as f32;
    {
        let band = &job.bands[band_index];
        let mut pixels = band.pixels.lock().unwrap();
        for (offset, contribution) in local.iter().enumerate() {
            pixels.sum[offset] += *contribution;
            pixels.avg[offset] = pixels.sum[offset] * avg_factor;
        }
    }

    job.stats.completed_samples.fetch_add(1, Ordering::Relaxed);
    job.stats.total_raycasts.fetch_add(raycasts, Ordering::Relaxed);

    // Queue the band's next sample unless the trace is done or cancelled.
    // Checked under the queue lock so a concurrent cancel either sees this
    // task before draining or stops it from being pushed at all.
    if sample + 1 < job.samples_per_pixel {
        let mut queue = shared.queue.lock().unwrap();
        let still_active = shared
            .job
            .read()
            .unwrap()
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, &job));
        if shared.rendering.load(Ordering::Acquire) && still_active {
            queue
                .tasks
                .push_back(pack_task(y_min as u16, y_max as u16, sample + 1));
            shared.tasks_cond.notify_one();
        }
    }
}

/// Recursive radiance estimate for one path.
fn cast_ray(ray: &Ray, world: &World, bvh: &BvhNode, raycasts: &mut u64, depth: u32) -> Color {
    if depth >= MAX_DEPTH {
        return Color::ZERO;
    }
    *raycasts += 1;

    let mut hit = HitRecord::default();
    // t_min 0.001 keeps secondary rays from re-hitting their own surface
    // (shadow acne).
    if bvh.hit(ray, 0.001, f64::INFINITY, &mut hit) {
        let emission = hit.material.emit(hit.uv, hit.point);
        match hit.material.scatter(ray, &hit) {
            Some(scatter) => {
                emission
                    + scatter.attenuation
                        * cast_ray(&scatter.scattered, world, bvh, raycasts, depth + 1)
            }
            None => emission,
        }
    } else {
        world.sky.sample(ray)
    }
}
