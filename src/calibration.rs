use crate::adjust::{AdjustmentMode, EyeModes};
use crate::config::CancelPolicy;
use crate::surface::{Eye, StereoRig, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationPhase {
    #[default]
    Idle,
    ShowingInstructions,
    InProgress,
}

impl CalibrationPhase {
    pub fn label(self) -> &'static str {
        match self {
            CalibrationPhase::Idle => "Idle",
            CalibrationPhase::ShowingInstructions => "Showing instructions",
            CalibrationPhase::InProgress => "In progress",
        }
    }

    pub fn is_idle(self) -> bool {
        self == CalibrationPhase::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Short,
    Long,
}

/// Distinguishes a long hold from a tap by accumulating frame time while held.
#[derive(Debug, Clone, Default)]
pub struct LongPressTracker {
    held_for: Option<f32>,
    fired: bool,
}

impl LongPressTracker {
    /// Feeds one frame. A long press is reported once, on the frame the hold
    /// reaches `threshold`; a short press is reported on release.
    pub fn update(&mut self, held: bool, dt: f32, threshold: f32) -> Option<PressKind> {
        match (self.held_for, held) {
            (None, false) => None,
            (None, true) => {
                self.held_for = Some(0.0);
                self.fired = false;
                None
            }
            (Some(elapsed), true) => {
                let elapsed = elapsed + dt.max(0.0);
                self.held_for = Some(elapsed);
                if !self.fired && elapsed >= threshold {
                    self.fired = true;
                    return Some(PressKind::Long);
                }
                None
            }
            (Some(_), false) => {
                self.held_for = None;
                if self.fired {
                    None
                } else {
                    Some(PressKind::Short)
                }
            }
        }
    }

    pub fn held_for(&self) -> Option<f32> {
        self.held_for
    }

    pub fn reset(&mut self) {
        self.held_for = None;
        self.fired = false;
    }
}

/// Live state captured when a session enters `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSession {
    pub snapshot: [Transform; 2],
    pub previous_modes: EyeModes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Ignored,
    InstructionsShown,
    InstructionsDismissed,
    Started,
    /// The caller should snapshot live state into a new profile.
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, Default)]
pub struct CalibrationWorkflow {
    phase: CalibrationPhase,
    session: Option<CalibrationSession>,
}

impl CalibrationWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn show_instructions(&mut self) -> WorkflowOutcome {
        if !self.phase.is_idle() {
            return WorkflowOutcome::Ignored;
        }
        self.phase = CalibrationPhase::ShowingInstructions;
        log::info!("[calibration] Showing instructions");
        WorkflowOutcome::InstructionsShown
    }

    /// Pulls the two surfaces apart around the default pose and starts adjusting in Move mode.
    pub fn confirm(&mut self, rig: &mut StereoRig, modes: &mut EyeModes, separation: f32) -> WorkflowOutcome {
        match self.phase {
            CalibrationPhase::Idle => WorkflowOutcome::Ignored,
            CalibrationPhase::ShowingInstructions => {
                self.session = Some(CalibrationSession { snapshot: rig.snapshot(), previous_modes: *modes });
                for eye in Eye::BOTH {
                    let mut transform = Transform::default();
                    transform.position.x += eye.lateral_sign() * separation;
                    rig.set_transform(eye, transform);
                }
                modes.set_all(AdjustmentMode::Move);
                self.phase = CalibrationPhase::InProgress;
                log::info!("[calibration] Session started, surfaces separated by {separation:.3} m");
                WorkflowOutcome::Started
            }
            CalibrationPhase::InProgress => {
                self.session = None;
                self.phase = CalibrationPhase::Idle;
                log::info!("[calibration] Session committed");
                WorkflowOutcome::Committed
            }
        }
    }

    pub fn cancel(&mut self, rig: &mut StereoRig, modes: &mut EyeModes, policy: CancelPolicy) -> WorkflowOutcome {
        match self.phase {
            CalibrationPhase::Idle => WorkflowOutcome::Ignored,
            CalibrationPhase::ShowingInstructions => {
                self.phase = CalibrationPhase::Idle;
                log::info!("[calibration] Instructions dismissed");
                WorkflowOutcome::InstructionsDismissed
            }
            CalibrationPhase::InProgress => {
                let session = self.session.take();
                match (policy, session) {
                    (CancelPolicy::RestoreSnapshot, Some(session)) => rig.restore(session.snapshot),
                    _ => rig.reset_to_defaults(),
                }
                if let Some(session) = session {
                    *modes = session.previous_modes;
                }
                self.phase = CalibrationPhase::Idle;
                log::info!("[calibration] Session cancelled ({})", policy.label());
                WorkflowOutcome::RolledBack
            }
        }
    }

    /// Whether stick adjustment and grabbing may touch the surfaces in the current phase.
    pub fn allows_adjustment(&self) -> bool {
        self.phase != CalibrationPhase::ShowingInstructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_press_fires_once_at_threshold() {
        let mut tracker = LongPressTracker::default();
        assert_eq!(tracker.update(true, 0.016, 1.0), None);
        let mut fired = 0;
        for _ in 0..100 {
            if tracker.update(true, 0.05, 1.0) == Some(PressKind::Long) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(tracker.update(false, 0.05, 1.0), None, "release after long press is not a tap");
    }

    #[test]
    fn release_before_threshold_is_short_press() {
        let mut tracker = LongPressTracker::default();
        tracker.update(true, 0.0, 1.0);
        tracker.update(true, 0.4, 1.0);
        assert_eq!(tracker.update(false, 0.1, 1.0), Some(PressKind::Short));
        assert_eq!(tracker.held_for(), None);
    }
}
