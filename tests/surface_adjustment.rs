use glam::{Vec2, Vec3};
use stereo_quad::adjust::{adjust_surface, AdjustmentMode, EyeModes, K_DEPTH, K_POS};
use stereo_quad::config::{SpeedConfig, SpeedField};
use stereo_quad::surface::{Eye, EyeSurface, StereoRig, Transform, DEFAULT_POSITION, SCALE_FLOOR};

const EPS: f32 = 1e-5;

fn assert_vec3_close(actual: Vec3, expected: Vec3, context: &str) {
    assert!((actual - expected).abs().max_element() < EPS, "{context}: expected {expected:?}, got {actual:?}");
}

#[test]
fn move_mode_translates_in_the_stick_plane() {
    let mut surface = EyeSurface::new(Eye::Left);
    let speeds = SpeedConfig { position_speed: 2.0, ..SpeedConfig::default() };
    assert!(adjust_surface(&mut surface, AdjustmentMode::Move, Vec2::new(0.5, -1.0), &speeds));
    let expected = DEFAULT_POSITION + Vec3::new(0.5, -1.0, 0.0) * 2.0 * K_POS;
    assert_vec3_close(surface.transform.position, expected, "position after one frame");
    assert_eq!(surface.transform.scale, Vec3::ONE, "move never touches scale");
}

#[test]
fn zero_stick_reports_no_change() {
    let mut surface = EyeSurface::new(Eye::Right);
    let before = surface;
    for mode in AdjustmentMode::ALL {
        assert!(!adjust_surface(&mut surface, mode, Vec2::ZERO, &SpeedConfig::default()), "{}", mode.label());
    }
    assert_eq!(surface, before);
}

#[test]
fn rotate_mode_rolls_and_wraps() {
    let mut surface = EyeSurface::new(Eye::Left);
    let speeds = SpeedConfig { rotation_speed: 10.0, ..SpeedConfig::default() };
    for _ in 0..40 {
        adjust_surface(&mut surface, AdjustmentMode::Rotate, Vec2::new(1.0, 0.0), &speeds);
        let roll = surface.transform.rotation.z;
        assert!((-180.0..180.0).contains(&roll), "roll {roll} escaped the wrapped range");
    }
    assert!((surface.transform.rotation.z - 40.0).abs() < 1e-3, "400 degrees wraps to 40");
    assert_eq!(surface.transform.position, DEFAULT_POSITION, "rotate does not translate");
}

#[test]
fn depth_mode_couples_scale_and_distance() {
    let mut surface = EyeSurface::new(Eye::Right);
    let speeds = SpeedConfig::default();
    assert!(adjust_surface(&mut surface, AdjustmentMode::Depth, Vec2::new(0.0, 1.0), &speeds));
    let grown = 1.0 + speeds.scale_speed * K_DEPTH;
    assert_vec3_close(surface.transform.scale, Vec3::new(grown, grown, 1.0), "scale grows on X and Y only");
    assert!(
        (surface.transform.position.z - (DEFAULT_POSITION.z + speeds.depth_adjust_speed)).abs() < EPS,
        "growing pushes the surface away"
    );

    adjust_surface(&mut surface, AdjustmentMode::Depth, Vec2::new(0.0, -1.0), &speeds);
    assert_vec3_close(surface.transform.scale, Vec3::ONE, "shrinking undoes the growth");
    assert!((surface.transform.position.z - DEFAULT_POSITION.z).abs() < EPS);
}

#[test]
fn depth_mode_still_moves_sideways() {
    let mut surface = EyeSurface::new(Eye::Left);
    adjust_surface(&mut surface, AdjustmentMode::Depth, Vec2::new(1.0, 0.0), &SpeedConfig::default());
    assert!((surface.transform.position.x - (DEFAULT_POSITION.x + K_POS)).abs() < EPS);
    assert_eq!(surface.transform.scale, Vec3::ONE);
}

#[test]
fn scale_never_drops_below_floor() {
    let mut surface = EyeSurface::new(Eye::Left);
    let speeds = SpeedConfig { scale_speed: 10.0, ..SpeedConfig::default() };
    for frame in 0..1000 {
        adjust_surface(&mut surface, AdjustmentMode::Depth, Vec2::new(0.0, -1.0), &speeds);
        let scale = surface.transform.scale;
        assert!(scale.x >= SCALE_FLOOR && scale.y >= SCALE_FLOOR, "frame {frame}: scale {scale:?} under the floor");
    }
    let settled = surface.transform;
    assert!(
        !adjust_surface(&mut surface, AdjustmentMode::Depth, Vec2::new(0.0, -1.0), &speeds),
        "a rejected update reports no change"
    );
    assert_eq!(surface.transform, settled, "rejected update leaves depth alone too");
}

#[test]
fn eyes_are_adjusted_independently() {
    let mut rig = StereoRig::new();
    adjust_surface(rig.surface_mut(Eye::Left), AdjustmentMode::Move, Vec2::new(1.0, 1.0), &SpeedConfig::default());
    assert_eq!(*rig.transform(Eye::Right), Transform::default(), "right eye untouched");
    assert_ne!(*rig.transform(Eye::Left), Transform::default());
}

#[test]
fn mode_cycle_wraps_after_every_variant() {
    let mut modes = EyeModes::default();
    let start = modes.get(Eye::Left);
    let mut visited = Vec::new();
    for _ in 0..AdjustmentMode::ALL.len() {
        visited.push(modes.cycle(Eye::Left));
    }
    assert_eq!(visited, vec![AdjustmentMode::Rotate, AdjustmentMode::Depth, AdjustmentMode::Move]);
    assert_eq!(modes.get(Eye::Left), start, "N cycles return to the start");
    assert_eq!(modes.get(Eye::Right), AdjustmentMode::Move, "other eye keeps its own mode");
}

#[test]
fn speed_settings_saturate() {
    let mut speeds = SpeedConfig::default();
    assert!(speeds.adjust(SpeedField::Deadzone, 5.0));
    assert_eq!(speeds.deadzone, 0.95);
    assert_eq!(speeds.set(SpeedField::DepthAdjust, -1.0), 0.000_001);
    let rotation = speeds.rotation_speed;
    let stored = speeds.set(SpeedField::Rotation, f32::NAN);
    assert_eq!(stored, rotation, "NaN is ignored");
}
