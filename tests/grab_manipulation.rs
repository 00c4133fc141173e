use glam::{Quat, Vec2, Vec3};
use stereo_quad::config::EngineConfig;
use stereo_quad::grab::{manipulate_with_grip, GrabRule, GrabState, GrabUpdate};
use stereo_quad::input::{ControllerSnapshot, InputSnapshot, Pose};
use stereo_quad::surface::{Eye, EyeSurface, Transform};
use stereo_quad::Engine;

const RULE: GrabRule = GrabRule { trigger_threshold: 0.8, requires_trigger: true };

fn gripping(pose: Pose) -> ControllerSnapshot {
    ControllerSnapshot { grip: true, trigger: 1.0, pose, ..Default::default() }
}

fn released(pose: Pose) -> ControllerSnapshot {
    ControllerSnapshot { pose, ..Default::default() }
}

fn assert_close(a: Vec3, b: Vec3, context: &str) {
    assert!((a - b).length() < 1e-4, "{context}: {a:?} vs {b:?}");
}

#[test]
fn grip_alone_does_not_grab_when_trigger_is_required() {
    let mut surface = EyeSurface::new(Eye::Left);
    let mut state = GrabState::default();
    let controller = ControllerSnapshot { grip: true, trigger: 0.5, ..Default::default() };
    assert_eq!(manipulate_with_grip(&controller, &RULE, &mut surface, &mut state), GrabUpdate::Idle);
    assert!(!state.is_grabbed());

    let loose = GrabRule { requires_trigger: false, ..RULE };
    assert_eq!(manipulate_with_grip(&controller, &loose, &mut surface, &mut state), GrabUpdate::Started);
}

#[test]
fn relative_pose_is_preserved_while_grabbed() {
    let mut surface = EyeSurface::new(Eye::Right);
    surface.transform = Transform::new(Vec3::new(0.1, 0.2, 1.5), Vec3::new(5.0, 170.0, -10.0), Vec3::ONE);
    let start_surface = surface.transform;
    let mut state = GrabState::default();

    let p0 = Pose::new(Vec3::new(0.0, 1.0, 0.3), Quat::from_rotation_y(0.3));
    assert_eq!(manipulate_with_grip(&gripping(p0), &RULE, &mut surface, &mut state), GrabUpdate::Started);
    assert_eq!(surface.transform, start_surface, "capture frame leaves the surface where it was");

    let poses = [
        Pose::new(Vec3::new(0.2, 1.1, 0.3), Quat::from_rotation_y(0.3)),
        Pose::new(Vec3::new(-0.4, 0.9, 0.1), Quat::from_rotation_y(-0.5) * Quat::from_rotation_x(0.2)),
        Pose::new(Vec3::new(0.0, 1.3, 0.6), Quat::from_rotation_z(1.0)),
    ];
    for p1 in poses {
        assert_eq!(manipulate_with_grip(&gripping(p1), &RULE, &mut surface, &mut state), GrabUpdate::Held);
        let expected_position = p1.position + (start_surface.position - p0.position);
        let expected_rotation = p1.rotation * (p0.rotation.inverse() * start_surface.rotation_quat());
        assert_close(surface.transform.position, expected_position, "position follows the controller");
        let angle = surface.transform.rotation_quat().angle_between(expected_rotation);
        assert!(angle < 1e-3, "rotation drifted by {angle} rad");
    }
}

#[test]
fn release_leaves_surface_in_place() {
    let mut surface = EyeSurface::new(Eye::Left);
    let mut state = GrabState::default();
    let p0 = Pose::new(Vec3::ZERO, Quat::IDENTITY);
    let p1 = Pose::new(Vec3::new(0.5, 0.0, 0.0), Quat::IDENTITY);
    manipulate_with_grip(&gripping(p0), &RULE, &mut surface, &mut state);
    manipulate_with_grip(&gripping(p1), &RULE, &mut surface, &mut state);
    let placed = surface.transform;

    let update = manipulate_with_grip(&released(Pose::default()), &RULE, &mut surface, &mut state);
    assert_eq!(update, GrabUpdate::Released);
    assert!(!state.is_grabbed(), "offset is discarded on release");
    assert_eq!(surface.transform, placed, "no snap-back on release");

    // A fresh grab captures a new offset instead of reusing the old one.
    manipulate_with_grip(&gripping(p0), &RULE, &mut surface, &mut state);
    manipulate_with_grip(&gripping(p0), &RULE, &mut surface, &mut state);
    assert_close(surface.transform.position, placed.position, "re-grab at a new pose does not jump");
}

#[test]
fn grab_takes_precedence_over_stick_input() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = EngineConfig {
        profiles_dir: dir.path().join("profiles"),
        default_profiles_dir: dir.path().join("no_defaults"),
        ..EngineConfig::default()
    };
    let mut engine = Engine::init(config);
    let idle = ControllerSnapshot::default();
    engine.tick(&InputSnapshot::both(idle, idle), 0.016);

    let pose = Pose::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY);
    let grab_with_stick = ControllerSnapshot { stick: Vec2::new(1.0, 1.0), ..gripping(pose) };
    let before = *engine.rig().transform(Eye::Left);
    engine.tick(&InputSnapshot::both(grab_with_stick, idle), 0.016);
    engine.tick(&InputSnapshot::both(grab_with_stick, idle), 0.016);
    assert!(engine.is_grabbed(Eye::Left));
    assert_close(engine.rig().transform(Eye::Left).position, before.position, "stationary grab ignores the stick");

    let moved = ControllerSnapshot { pose: Pose::new(Vec3::new(0.1, 1.0, 0.0), Quat::IDENTITY), ..grab_with_stick };
    engine.tick(&InputSnapshot::both(moved, idle), 0.016);
    assert_close(
        engine.rig().transform(Eye::Left).position,
        before.position + Vec3::new(0.1, 0.0, 0.0),
        "grabbed surface tracks the controller",
    );
    assert!(!engine.is_grabbed(Eye::Right), "grabs are per hand");
    assert!(engine.status().left_grabbed);
}
