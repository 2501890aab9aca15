//! Tessera Runtime
//!
//! Headless driver: boots a component manager, spawns a small scene and
//! runs a fixed number of simulation ticks through the stock systems, paced
//! against wall time at the fixed tick rate.
//!
//! Usage: `tessera [settings.json] [ticks]`

use anyhow::{Context, Result};
use std::time::Instant;
use tessera_core::components::{
    register_all, CameraComponent, PhysicsComponent, SelectableComponent, SpriteComponent,
    TransformComponent,
};
use tessera_core::ecs::ComponentManager;
use tessera_core::glam::Vec3;
use tessera_core::settings::EcsSettings;
use tessera_core::systems::{physics, render, selection};
use tessera_core::time::{SimulationTime, TICK_DURATION, TICK_RATE_HZ};
use tessera_metrics::{time_scope, FrameTimer, SystemProfiler};

const DEFAULT_TICKS: u64 = 600;
const SCENE_SIZE: usize = 256;

fn spawn_scene(manager: &mut ComponentManager) {
    manager.add_entity::<(TransformComponent, CameraComponent)>();

    for i in 0..SCENE_SIZE {
        let mut it = manager.add_entity::<(TransformComponent, SpriteComponent)>();
        let (transform, sprite) = it.components_mut();
        if let (Some(transform), Some(sprite)) = (transform, sprite) {
            transform.position = Vec3::new((i % 16) as f32, (i / 16) as f32, -20.0);
            sprite.texture = (i % 4) as u32;
        }
        let entity = it.entity();

        // Every other sprite falls, every fourth can be clicked.
        if i % 2 == 0 {
            manager.add_components::<(PhysicsComponent,)>(entity);
        }
        if i % 4 == 0 {
            manager.add_components::<(SelectableComponent,)>(entity);
        }
    }
}

/// One fixed simulation step. Returns the number of sprites gathered.
fn tick(manager: &mut ComponentManager, profiler: &mut SystemProfiler, time: &SimulationTime) -> usize {
    let dt = time.dt();

    time_scope!(profiler, "physics", {
        physics::integrate(manager, dt, physics::GRAVITY);
    });

    // Sprites that fell out of view are queued and compacted in one pass.
    let mut fallen = Vec::new();
    let mut it = manager.begin::<(TransformComponent, PhysicsComponent)>();
    while it.next() {
        if it.get::<TransformComponent>().is_some_and(|t| t.position.y < -50.0) {
            fallen.push(it.entity());
        }
    }
    for entity in fallen {
        manager.queue_entity_removal(entity);
    }
    time_scope!(profiler, "cleanup", {
        manager.cleanup_components::<PhysicsComponent, _>(|_| {});
        manager.cleanup_components::<SelectableComponent, _>(|_| {});
        manager.cleanup_components::<SpriteComponent, _>(|_| {});
        manager.cleanup_components::<TransformComponent, _>(|_| {});
    });

    if time.tick_count() % u64::from(TICK_RATE_HZ) == 0 {
        time_scope!(profiler, "selection", {
            selection::pick(manager, Vec3::new(8.0, 8.0, 0.0), Vec3::NEG_Z);
        });
    }

    time_scope!(profiler, "render", { render::gather_sprites(manager).len() })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Tessera v{}", tessera_core::VERSION);

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => EcsSettings::from_json_file(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => EcsSettings::default(),
    };
    let ticks = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid tick count '{n}'"))?,
        None => DEFAULT_TICKS,
    };

    let mut manager = ComponentManager::with_settings(settings);
    register_all(&mut manager, SCENE_SIZE);
    spawn_scene(&mut manager);
    tracing::info!(entities = manager.entity_count(), "scene spawned");

    let mut time = SimulationTime::new();
    let mut profiler = SystemProfiler::new();
    let mut frame_timer = FrameTimer::new(120);
    let mut sprites = 0;

    // Ticks run at the fixed rate against wall time; a slow frame catches
    // up with several ticks in a row.
    let mut last = Instant::now();
    while time.tick_count() < ticks {
        let now = Instant::now();
        let due = time.accumulate(now - last);
        last = now;

        for _ in 0..due {
            if time.tick_count() >= ticks {
                break;
            }
            frame_timer.begin();
            sprites = tick(&mut manager, &mut profiler, &time);
            time.advance_tick();
            frame_timer.end();
        }

        let alpha = time.alpha();
        tracing::trace!(due, alpha, "frame");
        std::thread::sleep(TICK_DURATION.mul_f32((1.0 - alpha).max(0.0)));
    }

    tracing::info!(
        ticks = time.tick_count(),
        simulated_secs = time.total_time().as_secs_f32(),
        sprites,
        "simulation finished"
    );
    manager.log_diagnostics();

    for (name, value) in manager.counters().snapshot() {
        tracing::info!(counter = name, value, "ecs counter");
    }
    for (name, total, calls) in profiler.report() {
        tracing::info!(system = name, calls, total_ms = total.as_secs_f64() * 1000.0, "system time");
    }
    let (min, max) = frame_timer.frame_time_range_ms();
    tracing::info!(
        frames = frame_timer.frames(),
        avg_ms = frame_timer.frame_time_ms(),
        min_ms = min,
        max_ms = max,
        "frame timing"
    );

    Ok(())
}
