use crate::input::{ControllerSnapshot, Pose};
use crate::surface::EyeSurface;
use glam::{Quat, Vec3};

/// Offsets captured when a grab starts. Only exists while the grab is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabOffset {
    pub position: Vec3,
    pub rotation: Quat,
}

impl GrabOffset {
    /// Captures the surface pose relative to the controller pose.
    pub fn capture(controller: &Pose, surface: &EyeSurface) -> Self {
        let transform = &surface.transform;
        Self {
            position: transform.position - controller.position,
            rotation: controller.rotation.inverse() * transform.rotation_quat(),
        }
    }

    /// Surface pose that keeps this offset relative to `controller`.
    pub fn resolve(&self, controller: &Pose) -> Pose {
        Pose { position: controller.position + self.position, rotation: controller.rotation * self.rotation }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrabState {
    offset: Option<GrabOffset>,
}

/// What a call to [`manipulate_with_grip`] did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabUpdate {
    Idle,
    Started,
    Held,
    Released,
}

impl GrabUpdate {
    /// True when the grab owns the surface this frame.
    pub fn is_active(self) -> bool {
        matches!(self, GrabUpdate::Started | GrabUpdate::Held)
    }
}

impl GrabState {
    pub fn is_grabbed(&self) -> bool {
        self.offset.is_some()
    }

    pub fn release(&mut self) {
        self.offset = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabRule {
    pub trigger_threshold: f32,
    pub requires_trigger: bool,
}

impl GrabRule {
    pub fn is_active(&self, controller: &ControllerSnapshot) -> bool {
        controller.grip && (!self.requires_trigger || controller.trigger > self.trigger_threshold)
    }
}

/// Drives `surface` from the controller pose while the grab condition holds.
///
/// The offset is captured on the first active frame; releasing the grab leaves the
/// surface wherever it was last placed.
pub fn manipulate_with_grip(
    controller: &ControllerSnapshot,
    rule: &GrabRule,
    surface: &mut EyeSurface,
    state: &mut GrabState,
) -> GrabUpdate {
    if !rule.is_active(controller) {
        if state.is_grabbed() {
            state.release();
            return GrabUpdate::Released;
        }
        return GrabUpdate::Idle;
    }
    let Some(offset) = state.offset else {
        // Resolving on the capture frame would reproduce the current pose.
        state.offset = Some(GrabOffset::capture(&controller.pose, surface));
        return GrabUpdate::Started;
    };
    let pose = offset.resolve(&controller.pose);
    surface.transform.position = pose.position;
    surface.transform.set_rotation_quat(pose.rotation);
    GrabUpdate::Held
}
