use crate::adjust::AdjustmentMode;
use crate::calibration::CalibrationPhase;
use crate::config::SpeedConfig;
use crate::surface::Eye;
use std::collections::VecDeque;
use std::fmt;

/// Everything the presentation layer needs to draw the HUD.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    pub left_mode: AdjustmentMode,
    pub right_mode: AdjustmentMode,
    pub speeds: SpeedConfig,
    pub phase: CalibrationPhase,
    pub active_profile: Option<String>,
    pub hud_visible: bool,
    pub left_grabbed: bool,
    pub right_grabbed: bool,
    pub devices_ready: bool,
}

impl StatusRecord {
    pub fn mode(&self, eye: Eye) -> AdjustmentMode {
        match eye {
            Eye::Left => self.left_mode,
            Eye::Right => self.right_mode,
        }
    }

    pub fn grabbed(&self, eye: Eye) -> bool {
        match eye {
            Eye::Left => self.left_grabbed,
            Eye::Right => self.right_grabbed,
        }
    }
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "left={}{} right={}{} phase={} profile={} hud={} pos={:.3} rot={:.2} scale={:.3} depth={:.6} deadzone={:.2}",
            self.left_mode.label(),
            if self.left_grabbed { "(grab)" } else { "" },
            self.right_mode.label(),
            if self.right_grabbed { "(grab)" } else { "" },
            self.phase.label(),
            self.active_profile.as_deref().unwrap_or("-"),
            if self.hud_visible { "on" } else { "off" },
            self.speeds.position_speed,
            self.speeds.rotation_speed,
            self.speeds.scale_speed,
            self.speeds.depth_adjust_speed,
            self.speeds.deadzone,
        )?;
        if !self.devices_ready {
            write!(f, " [waiting for controllers]")?;
        }
        Ok(())
    }
}

/// Most records the feed holds before dropping the oldest.
pub const STATUS_FEED_CAPACITY: usize = 256;

/// Queue of emitted status records, drained by the host.
///
/// A host that never drains still sees the newest state; older records are
/// dropped once [`STATUS_FEED_CAPACITY`] is reached.
#[derive(Default)]
pub struct StatusFeed {
    records: VecDeque<StatusRecord>,
}

impl StatusFeed {
    pub fn push(&mut self, record: StatusRecord) {
        if self.records.len() == STATUS_FEED_CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn drain(&mut self) -> Vec<StatusRecord> {
        self.records.drain(..).collect()
    }
}
