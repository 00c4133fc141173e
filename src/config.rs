use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedField {
    Position,
    Rotation,
    Scale,
    DepthAdjust,
    Deadzone,
}

impl SpeedField {
    pub const ALL: [SpeedField; 5] = [
        SpeedField::Position,
        SpeedField::Rotation,
        SpeedField::Scale,
        SpeedField::DepthAdjust,
        SpeedField::Deadzone,
    ];

    /// Inclusive valid range for the field.
    pub const fn range(self) -> (f32, f32) {
        match self {
            SpeedField::Position => (0.001, 10.0),
            SpeedField::Rotation => (0.01, 10.0),
            SpeedField::Scale => (0.001, 10.0),
            SpeedField::DepthAdjust => (0.000_001, 0.1),
            SpeedField::Deadzone => (0.0, 0.95),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedField::Position => "position",
            SpeedField::Rotation => "rotation",
            SpeedField::Scale => "scale",
            SpeedField::DepthAdjust => "depth",
            SpeedField::Deadzone => "deadzone",
        }
    }
}

/// Session-wide tuning for the adjustment engine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpeedConfig {
    #[serde(default = "SpeedConfig::default_position_speed")]
    pub position_speed: f32,
    #[serde(default = "SpeedConfig::default_rotation_speed")]
    pub rotation_speed: f32,
    #[serde(default = "SpeedConfig::default_scale_speed")]
    pub scale_speed: f32,
    #[serde(default = "SpeedConfig::default_depth_adjust_speed")]
    pub depth_adjust_speed: f32,
    #[serde(default = "SpeedConfig::default_deadzone")]
    pub deadzone: f32,
}

impl SpeedConfig {
    pub const fn default_position_speed() -> f32 {
        1.0
    }

    pub const fn default_rotation_speed() -> f32 {
        0.5
    }

    pub const fn default_scale_speed() -> f32 {
        1.0
    }

    pub const fn default_depth_adjust_speed() -> f32 {
        0.001
    }

    pub const fn default_deadzone() -> f32 {
        0.1
    }

    pub fn get(&self, field: SpeedField) -> f32 {
        match field {
            SpeedField::Position => self.position_speed,
            SpeedField::Rotation => self.rotation_speed,
            SpeedField::Scale => self.scale_speed,
            SpeedField::DepthAdjust => self.depth_adjust_speed,
            SpeedField::Deadzone => self.deadzone,
        }
    }

    fn slot_mut(&mut self, field: SpeedField) -> &mut f32 {
        match field {
            SpeedField::Position => &mut self.position_speed,
            SpeedField::Rotation => &mut self.rotation_speed,
            SpeedField::Scale => &mut self.scale_speed,
            SpeedField::DepthAdjust => &mut self.depth_adjust_speed,
            SpeedField::Deadzone => &mut self.deadzone,
        }
    }

    /// Sets a field, saturating at its range. Returns the stored value.
    pub fn set(&mut self, field: SpeedField, value: f32) -> f32 {
        let (min, max) = field.range();
        let slot = self.slot_mut(field);
        // NaN keeps the previous value.
        if !value.is_nan() {
            *slot = value.clamp(min, max);
        }
        *slot
    }

    /// Adds `delta` to a field, saturating at its range. Returns true when the value changed.
    pub fn adjust(&mut self, field: SpeedField, delta: f32) -> bool {
        let before = self.get(field);
        let after = self.set(field, before + delta);
        after != before
    }

    pub fn clamped(mut self) -> Self {
        for field in SpeedField::ALL {
            let value = self.get(field);
            let (min, max) = field.range();
            let sanitized = if value.is_nan() { Self::default().get(field) } else { value.clamp(min, max) };
            *self.slot_mut(field) = sanitized;
        }
        self
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            position_speed: Self::default_position_speed(),
            rotation_speed: Self::default_rotation_speed(),
            scale_speed: Self::default_scale_speed(),
            depth_adjust_speed: Self::default_depth_adjust_speed(),
            deadzone: Self::default_deadzone(),
        }
    }
}

/// What a cancelled calibration session rolls the surfaces back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Compiled-in default pose.
    #[default]
    RestoreDefaults,
    /// Whatever was live when the session started.
    RestoreSnapshot,
}

impl CancelPolicy {
    pub fn label(self) -> &'static str {
        match self {
            CancelPolicy::RestoreDefaults => "Restore defaults",
            CancelPolicy::RestoreSnapshot => "Restore pre-session pose",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_profiles_dir")]
    pub profiles_dir: PathBuf,
    #[serde(default = "EngineConfig::default_default_profiles_dir")]
    pub default_profiles_dir: PathBuf,
    #[serde(default)]
    pub bindings_path: Option<PathBuf>,
    #[serde(default = "EngineConfig::default_long_press_seconds")]
    pub long_press_seconds: f32,
    #[serde(default = "EngineConfig::default_grab_trigger_threshold")]
    pub grab_trigger_threshold: f32,
    #[serde(default = "EngineConfig::default_grab_requires_trigger")]
    pub grab_requires_trigger: bool,
    #[serde(default = "EngineConfig::default_trigger_press_threshold")]
    pub trigger_press_threshold: f32,
    #[serde(default = "EngineConfig::default_calibration_separation")]
    pub calibration_separation: f32,
    #[serde(default)]
    pub cancel_policy: CancelPolicy,
    #[serde(default)]
    pub speeds: SpeedConfig,
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfigOverrides {
    pub profiles_dir: Option<PathBuf>,
    pub default_profiles_dir: Option<PathBuf>,
    pub bindings_path: Option<PathBuf>,
}

impl EngineConfig {
    fn default_profiles_dir() -> PathBuf {
        PathBuf::from("profiles")
    }

    fn default_default_profiles_dir() -> PathBuf {
        PathBuf::from("default_profiles")
    }

    const fn default_long_press_seconds() -> f32 {
        1.0
    }

    const fn default_grab_trigger_threshold() -> f32 {
        0.8
    }

    const fn default_grab_requires_trigger() -> bool {
        true
    }

    const fn default_trigger_press_threshold() -> f32 {
        0.5
    }

    const fn default_calibration_separation() -> f32 {
        0.1
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut cfg: EngineConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        cfg.speeds = cfg.speeds.clamped();
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &EngineConfigOverrides) {
        if let Some(dir) = &overrides.profiles_dir {
            self.profiles_dir = dir.clone();
        }
        if let Some(dir) = &overrides.default_profiles_dir {
            self.default_profiles_dir = dir.clone();
        }
        if let Some(path) = &overrides.bindings_path {
            self.bindings_path = Some(path.clone());
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profiles_dir: Self::default_profiles_dir(),
            default_profiles_dir: Self::default_default_profiles_dir(),
            bindings_path: None,
            long_press_seconds: Self::default_long_press_seconds(),
            grab_trigger_threshold: Self::default_grab_trigger_threshold(),
            grab_requires_trigger: Self::default_grab_requires_trigger(),
            trigger_press_threshold: Self::default_trigger_press_threshold(),
            calibration_separation: Self::default_calibration_separation(),
            cancel_policy: CancelPolicy::default(),
            speeds: SpeedConfig::default(),
        }
    }
}

impl EngineConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.profiles_dir.is_none() && self.default_profiles_dir.is_none() && self.bindings_path.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.profiles_dir.is_some() {
            fields.push("profiles_dir");
        }
        if self.default_profiles_dir.is_some() {
            fields.push("default_profiles_dir");
        }
        if self.bindings_path.is_some() {
            fields.push("bindings_path");
        }
        fields
    }
}
