//! End-to-end formation scenarios.
//!
//! These drive a mounted engine (or the physics step directly) through the
//! behaviors a host relies on: orbit at rest, assembly, determinism, ripple
//! lifetime, the hit ladder and rebuilds on resize.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use textswarm::particle::Orbit;
use textswarm::physics::{step_particle, StepInput};
use textswarm::raster::rasterize;
use textswarm::{
    BitmapFont, EmitOutcome, Engine, EngineConfig, MotionPreference, Particle, Phase,
    PhysicsConfig, ProgressBands, Ripple, RippleConfig, Vec2,
};

const DT: f32 = 1.0 / 60.0;

fn mount(text: &str, w: u32, h: u32) -> Engine {
    Engine::mount(EngineConfig::new(text), w, h, &MotionPreference::full())
        .unwrap()
        .unwrap()
}

fn run(engine: &mut Engine, ticks: usize) {
    for _ in 0..ticks {
        engine.tick(DT).unwrap();
    }
}

// ============================================================================
// Rest and assembly
// ============================================================================

#[test]
fn test_phase_zero_returns_to_orbit_after_disturbance() {
    let mut engine = mount("HELLO", 480, 240);

    // Disturb everything while the text is held
    engine.set_progress(0.6);
    engine.pointer_moved(Vec2::new(240.0, 120.0));
    let center = engine.text_center().unwrap();
    for _ in 0..4 {
        engine.click(center);
        run(&mut engine, 20);
    }
    assert!(engine.pool().iter().any(|p| p.loose.hit_count > 0));

    // Fall apart and idle
    engine.pointer_left();
    engine.set_progress(0.0);
    run(&mut engine, 900);

    let pool_center = engine.pool().center();
    let time = engine.time();
    for p in engine.pool().iter() {
        let on_orbit = p.orbit.position(pool_center, time);
        assert!(
            p.position.distance(on_orbit) < 0.05,
            "{:?} is {} px off its orbit",
            p.origin,
            p.position.distance(on_orbit)
        );
        assert_eq!(p.loose.hit_count, 0);
        assert!(!p.loose.is_active());
    }
}

#[test]
fn test_phase_one_converges_to_origin() {
    let mut engine = mount("HELLO", 480, 240);
    engine.set_progress(0.6);
    assert_eq!(engine.progress().value, 1.0);

    run(&mut engine, 600);

    for p in engine.pool().iter() {
        assert!(
            p.position.distance(p.origin) < 0.05,
            "{:?} stuck at {:?}",
            p.origin,
            p.position
        );
    }
}

#[test]
fn test_pointer_does_not_move_resting_particles_at_phase_zero() {
    let mut a = mount("HI", 300, 150);
    let mut b = mount("HI", 300, 150);
    b.pointer_moved(Vec2::new(10.0, 10.0));

    run(&mut a, 30);
    run(&mut b, 30);

    for (pa, pb) in a.pool().iter().zip(b.pool().iter()) {
        assert!(pa.position.distance(pb.position) < 1e-3);
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_rasterization_is_deterministic() {
    let config = EngineConfig::new("SAME SEED").with_seed(42);
    let palette = config.colors.palette().unwrap();

    let raster = |seed: u64| {
        let mut rng = SmallRng::seed_from_u64(seed);
        rasterize(
            &config.raster,
            &BitmapFont::new(),
            &palette,
            config.colors.mode,
            640,
            200,
            &mut rng,
        )
    };

    let first = raster(42);
    let second = raster(42);
    assert!(!first.points.is_empty());
    assert_eq!(first.points, second.points);
    assert_eq!(first.font_size, second.font_size);

    let other = raster(43);
    assert_ne!(first.points, other.points);
}

#[test]
fn test_engines_with_same_config_build_same_pool() {
    let a = mount("TWIN", 400, 200);
    let b = mount("TWIN", 400, 200);
    assert_eq!(a.pool().particles(), b.pool().particles());
}

// ============================================================================
// Progress mapping
// ============================================================================

#[test]
fn test_phase_value_continuous_at_band_edges() {
    let bands = ProgressBands::default();
    let eps = 1e-3;
    for edge in [0.45_f32, 0.75] {
        let below = bands.map(edge - 1e-5).value;
        let at = bands.map(edge).value;
        let above = bands.map(edge + 1e-5).value;
        assert!((below - at).abs() < eps, "jump below {}", edge);
        assert!((above - at).abs() < eps, "jump above {}", edge);
    }
}

#[test]
fn test_assembling_sweep_is_monotonic() {
    let bands = ProgressBands::default();
    let n = 200;
    let mut last = -1.0;
    for i in 0..=n {
        let p = 0.45 * i as f32 / n as f32;
        let value = bands.map(p).value;
        assert!(value >= last, "phase value fell at p = {}", p);
        last = value;
    }
    assert_eq!(bands.map(0.0).value, 0.0);
    assert!((last - 1.0).abs() < 1e-4);
}

// ============================================================================
// Ripples
// ============================================================================

#[test]
fn test_center_click_spawns_one_ripple_until_spent() {
    let mut engine = mount("HELLO", 480, 240);
    engine.set_progress(0.6);
    assert_eq!(engine.progress().phase, Phase::Holding);

    let center = engine.text_center().unwrap();
    let outcome = engine.click(center);
    let EmitOutcome::Spawned(id) = outcome else {
        panic!("click was not accepted: {:?}", outcome);
    };

    assert_eq!(engine.ripples().len(), 1);
    let ripple = engine.ripples().ripples()[0];
    assert_eq!(ripple.id, id);
    assert_eq!(ripple.origin, center);
    assert_eq!(ripple.radius, 0.0);
    assert_eq!(ripple.strength, 1.0);

    let mut last = ripple.strength;
    let mut ticks = 0;
    while let Some(r) = engine.ripples().ripples().iter().find(|r| r.id == id).copied() {
        assert!(r.strength > 0.0);
        assert!(r.strength <= last);
        last = r.strength;
        engine.tick(DT).unwrap();
        ticks += 1;
        assert!(ticks < 1000, "ripple never expired");
    }
    assert!(engine.ripples().is_empty());
}

#[test]
fn test_clicks_outside_hold_are_ignored() {
    let mut engine = mount("HELLO", 480, 240);
    engine.set_progress(0.2);
    assert_eq!(engine.click(Vec2::new(240.0, 120.0)), EmitOutcome::NotHolding);
    engine.set_progress(0.9);
    assert_eq!(engine.click(Vec2::new(240.0, 120.0)), EmitOutcome::NotHolding);
    assert!(engine.ripples().is_empty());
}

#[test]
fn test_rapid_clicks_are_capped_not_queued() {
    let mut engine = mount("HELLO", 480, 240);
    engine.set_progress(0.6);
    let cap = engine.config().ripples.cap;
    for _ in 0..cap * 3 {
        engine.click(Vec2::new(100.0, 100.0));
    }
    assert_eq!(engine.ripples().len(), cap);

    // Nothing comes back once the active ones expire
    run(&mut engine, 200);
    assert!(engine.ripples().is_empty());
}

// ============================================================================
// Hit ladder
// ============================================================================

fn held_particle() -> Particle {
    let orbit = Orbit {
        angle: 1.0,
        radius: 150.0,
        speed: 0.2,
    };
    Particle::new(Vec2::new(100.0, 100.0), orbit, Vec2::new(200.0, 100.0)).with_size(2.0)
}

/// A ripple whose band sits right on the particle's provisional position.
fn ripple_on(p: &Particle, id: u64) -> Ripple {
    let at = p.origin + p.disturbance.offset;
    Ripple::new(id, at - Vec2::new(30.0, 0.0)).with_radius(30.0)
}

fn step_with(p: &mut Particle, raw: f32, ripples: &[Ripple], config: &PhysicsConfig) -> bool {
    let input = StepInput {
        progress: ProgressBands::default().map(raw),
        time: 0.0,
        dt: DT,
        pointer: None,
        ripples,
        ripple_config: &RippleConfig::default(),
    };
    step_particle(p, Vec2::new(200.0, 100.0), Vec2::new(400.0, 200.0), config, &input)
}

#[test]
fn test_six_hits_reach_top_tier_and_reset_on_disassembly() {
    let config = PhysicsConfig::default();
    let mut p = held_particle();

    for id in 1..=6 {
        let ripple = ripple_on(&p, id);
        assert!(step_with(&mut p, 0.6, &[ripple], &config), "hit {} missed", id);
    }

    let top = config.top_tier().unwrap();
    assert_eq!(p.loose.hit_count, 6);
    assert_eq!(p.loose.timer, top.timer);
    assert_eq!(top.timer, 6.0);

    // Holding keeps the timer frozen
    step_with(&mut p, 0.6, &[], &config);
    assert_eq!(p.loose.timer, 6.0);

    // Full disassembly heals
    step_with(&mut p, 0.0, &[], &config);
    assert_eq!(p.loose.hit_count, 0);
    assert!(!p.loose.is_active());
}

#[test]
fn test_hits_count_once_per_ripple_and_only_while_holding() {
    let config = PhysicsConfig::default();
    let mut p = held_particle();

    let first = ripple_on(&p, 1);
    assert!(step_with(&mut p, 0.6, &[first], &config));
    let again = ripple_on(&p, 1);
    assert!(!step_with(&mut p, 0.6, &[again], &config));
    assert_eq!(p.loose.hit_count, 1);

    // Dispersing: pushed, but not counted
    let before = p.disturbance.velocity;
    let late = ripple_on(&p, 2);
    assert!(!step_with(&mut p, 0.8, &[late], &config));
    assert_eq!(p.loose.hit_count, 1);
    assert_ne!(p.disturbance.velocity, before);

    // Above the heal threshold nothing resets
    step_with(&mut p, 0.2, &[], &config);
    assert_eq!(p.loose.hit_count, 1);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_rebuilds_from_new_rasterization() {
    let mut engine = mount("HELLO", 400, 200);
    engine.set_progress(0.3);
    run(&mut engine, 10);
    let old_count = engine.pool().text_count();

    engine.resize(800, 400);
    assert_eq!(engine.rebuild_count(), 2);

    let config = engine.config().clone();
    let palette = config.colors.palette().unwrap();
    let mut rng = SmallRng::seed_from_u64(config.raster.seed);
    let expected = rasterize(
        &config.raster,
        &BitmapFont::new(),
        &palette,
        config.colors.mode,
        800,
        400,
        &mut rng,
    );

    assert_eq!(engine.pool().text_count(), expected.points.len());
    assert_ne!(engine.pool().text_count(), old_count);
    let origins: Vec<Vec2> = engine
        .pool()
        .iter()
        .take(expected.points.len())
        .map(|p| p.origin)
        .collect();
    let targets: Vec<Vec2> = expected.points.iter().map(|t| t.position).collect();
    assert_eq!(origins, targets);

    // Valid to tick straight away
    assert!(engine.tick(DT).is_some());
}

#[test]
fn test_resize_to_nothing_goes_inert_and_back() {
    let mut engine = mount("HELLO", 400, 200);
    engine.resize(0, 200);
    assert!(!engine.is_running());
    assert!(engine.tick(DT).is_none());

    engine.resize(400, 200);
    assert!(engine.is_running());
    assert!(engine.tick(DT).is_some());
}
