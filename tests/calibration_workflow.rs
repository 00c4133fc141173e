use glam::Vec2;
use stereo_quad::adjust::AdjustmentMode;
use stereo_quad::calibration::{CalibrationPhase, WorkflowOutcome};
use stereo_quad::config::{CancelPolicy, EngineConfig};
use stereo_quad::input::{ControllerSnapshot, InputSnapshot};
use stereo_quad::surface::{Eye, Transform, DEFAULT_POSITION};
use stereo_quad::Engine;
use tempfile::TempDir;

const DT: f32 = 0.25;

fn engine_in(dir: &TempDir, policy: CancelPolicy) -> Engine {
    let config = EngineConfig {
        profiles_dir: dir.path().join("profiles"),
        default_profiles_dir: dir.path().join("defaults"),
        cancel_policy: policy,
        ..EngineConfig::default()
    };
    let mut engine = Engine::init(config);
    engine.tick(&idle_frame(), DT);
    engine
}

fn idle_frame() -> InputSnapshot {
    InputSnapshot::both(ControllerSnapshot::default(), ControllerSnapshot::default())
}

fn frame(left: ControllerSnapshot, right: ControllerSnapshot) -> InputSnapshot {
    InputSnapshot::both(left, right)
}

/// Presses and releases a button over two ticks.
fn tap(engine: &mut Engine, left: ControllerSnapshot, right: ControllerSnapshot) {
    engine.tick(&frame(left, right), DT);
    engine.tick(&idle_frame(), DT);
}

fn menu() -> ControllerSnapshot {
    ControllerSnapshot { menu: true, ..Default::default() }
}

fn secondary() -> ControllerSnapshot {
    ControllerSnapshot { secondary: true, ..Default::default() }
}

fn none() -> ControllerSnapshot {
    ControllerSnapshot::default()
}

fn hold_menu(engine: &mut Engine, frames: usize) {
    for _ in 0..frames {
        engine.tick(&frame(menu(), none()), DT);
    }
    engine.tick(&idle_frame(), DT);
}

fn start_session(engine: &mut Engine) {
    hold_menu(engine, 5);
    assert_eq!(engine.phase(), CalibrationPhase::ShowingInstructions, "long press opens the instructions");
    tap(engine, none(), secondary());
    assert_eq!(engine.phase(), CalibrationPhase::InProgress, "confirm starts the session");
}

#[test]
fn long_press_opens_instructions_and_short_press_toggles_hud() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreDefaults);
    assert!(engine.hud_visible());

    hold_menu(&mut engine, 2);
    assert_eq!(engine.phase(), CalibrationPhase::Idle, "short hold does not calibrate");
    assert!(!engine.hud_visible(), "short press toggles the HUD");

    hold_menu(&mut engine, 5);
    assert_eq!(engine.phase(), CalibrationPhase::ShowingInstructions);
    assert!(!engine.hud_visible(), "a long press is not also a tap");
}

#[test]
fn instructions_can_be_dismissed_and_pause_adjustment() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreDefaults);
    hold_menu(&mut engine, 5);
    let before = engine.rig().snapshot();

    let pushing = ControllerSnapshot { stick: Vec2::new(1.0, 1.0), ..Default::default() };
    engine.tick(&frame(pushing, pushing), DT);
    assert_eq!(engine.rig().snapshot(), before, "sticks do nothing while instructions show");

    tap(&mut engine, secondary(), none());
    assert_eq!(engine.phase(), CalibrationPhase::Idle, "cancel dismisses the instructions");
    assert_eq!(engine.rig().snapshot(), before, "dismissing does not roll anything back");
}

#[test]
fn starting_separates_surfaces_and_selects_move() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreDefaults);
    engine.set_mode(Eye::Left, AdjustmentMode::Depth);
    engine.set_mode(Eye::Right, AdjustmentMode::Rotate);
    start_session(&mut engine);

    let left = engine.rig().transform(Eye::Left).position;
    let right = engine.rig().transform(Eye::Right).position;
    assert!((left.x - (DEFAULT_POSITION.x - 0.1)).abs() < 1e-6);
    assert!((right.x - (DEFAULT_POSITION.x + 0.1)).abs() < 1e-6);
    assert!((right.x - left.x - 0.2).abs() < 1e-6, "surfaces are pulled apart symmetrically");
    assert_eq!(engine.mode(Eye::Left), AdjustmentMode::Move);
    assert_eq!(engine.mode(Eye::Right), AdjustmentMode::Move);
}

#[test]
fn committing_creates_an_active_calibration_profile() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreDefaults);
    let profiles_before = engine.store().len();
    start_session(&mut engine);

    let nudge = ControllerSnapshot { stick: Vec2::new(0.0, 1.0), ..Default::default() };
    engine.tick(&frame(nudge, none()), DT);
    let live = engine.rig().snapshot();

    tap(&mut engine, none(), secondary());
    assert_eq!(engine.phase(), CalibrationPhase::Idle);
    assert_eq!(engine.store().len(), profiles_before + 1);
    let active = engine.store().active().expect("active profile");
    assert!(active.name.starts_with("Calibration_"), "unexpected name {}", active.name);
    assert_eq!([active.left, active.right], live, "profile captures the live transforms");
    assert!(engine.store().path_for(&active.name).is_file(), "profile was written to disk");
    assert_eq!(engine.status().active_profile.as_deref(), Some(active.name.as_str()));
}

#[test]
fn cancel_restores_defaults_by_default() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreDefaults);
    let nudge = ControllerSnapshot { stick: Vec2::new(1.0, 0.0), ..Default::default() };
    engine.tick(&frame(nudge, nudge), DT);
    assert_ne!(*engine.rig().transform(Eye::Left), Transform::default());

    start_session(&mut engine);
    engine.tick(&frame(nudge, nudge), DT);
    tap(&mut engine, secondary(), none());

    assert_eq!(engine.phase(), CalibrationPhase::Idle);
    for eye in Eye::BOTH {
        assert_eq!(*engine.rig().transform(eye), Transform::default(), "{} rolled back to the default pose", eye.label());
    }
}

#[test]
fn cancel_can_restore_the_pre_session_pose() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreSnapshot);
    let nudge = ControllerSnapshot { stick: Vec2::new(1.0, 0.0), ..Default::default() };
    engine.tick(&frame(nudge, none()), DT);
    engine.set_mode(Eye::Right, AdjustmentMode::Depth);
    let before = engine.rig().snapshot();

    start_session(&mut engine);
    engine.tick(&frame(nudge, nudge), DT);
    assert_ne!(engine.rig().snapshot(), before);
    assert_eq!(engine.cancel_calibration(), WorkflowOutcome::RolledBack);

    assert_eq!(engine.rig().snapshot(), before, "pre-session transforms come back exactly");
    assert_eq!(engine.mode(Eye::Right), AdjustmentMode::Depth, "pre-session modes come back too");
}

#[test]
fn profile_actions_are_ignored_during_a_session() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreDefaults);
    let profiles_before = engine.store().len();
    start_session(&mut engine);

    tap(&mut engine, none(), menu());
    assert_eq!(engine.store().len(), profiles_before, "create is suppressed while calibrating");

    let click = ControllerSnapshot { stick_click: true, ..Default::default() };
    let separated = engine.rig().snapshot();
    tap(&mut engine, click, click);
    assert_eq!(engine.rig().snapshot(), separated, "reset is suppressed while calibrating");
}

#[test]
fn confirm_and_cancel_do_nothing_when_idle() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreDefaults);
    assert_eq!(engine.confirm_calibration(), WorkflowOutcome::Ignored);
    assert_eq!(engine.cancel_calibration(), WorkflowOutcome::Ignored);
    assert!(engine.begin_calibration());
    assert!(!engine.begin_calibration(), "already showing instructions");
}

#[test]
fn shutdown_cancels_an_open_session() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut engine = engine_in(&dir, CancelPolicy::RestoreDefaults);
    start_session(&mut engine);
    let record = engine.shutdown();
    assert_eq!(record.phase, CalibrationPhase::Idle);
    assert_eq!(record.left_mode, AdjustmentMode::Move);
}
