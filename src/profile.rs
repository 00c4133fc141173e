use crate::config::SpeedConfig;
use crate::surface::{Eye, StereoRig, Transform};
use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROFILE_NAME: &str = "Default";
pub const PROFILE_EXTENSION: &str = "json";

/// A named snapshot of both eye transforms and the adjustment speeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub left: Transform,
    pub right: Transform,
    pub speeds: SpeedConfig,
}

impl Profile {
    /// The profile synthesised when storage holds nothing.
    pub fn builtin_default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            left: Transform::default(),
            right: Transform::default(),
            speeds: SpeedConfig::default(),
        }
    }

    pub fn from_live(name: impl Into<String>, rig: &StereoRig, speeds: &SpeedConfig) -> Self {
        Self {
            name: name.into(),
            left: *rig.transform(Eye::Left),
            right: *rig.transform(Eye::Right),
            speeds: *speeds,
        }
    }

    pub fn transform(&self, eye: Eye) -> &Transform {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }

    /// Copies the stored transforms and speeds onto live state. The live deadzone is kept.
    pub fn apply_to(&self, rig: &mut StereoRig, speeds: &mut SpeedConfig) {
        rig.set_transform(Eye::Left, self.left);
        rig.set_transform(Eye::Right, self.right);
        let deadzone = speeds.deadzone;
        *speeds = SpeedConfig { deadzone, ..self.speeds };
    }

    pub fn to_json(&self) -> Result<String> {
        let file = ProfileFile::from(self);
        serde_json::to_string_pretty(&file).with_context(|| format!("Encoding profile '{}'", self.name))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let file: ProfileFile = serde_json::from_str(contents)?;
        Profile::try_from(file)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).with_context(|| format!("Reading profile file {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("Parsing profile file {}", path.display()))
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating profile directory {}", parent.display()))?;
        }
        let json = self.to_json()?;
        fs::write(path, json.as_bytes()).with_context(|| format!("Writing profile file {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Data {
    fn from(value: Vec3) -> Self {
        Self { x: value.x, y: value.y, z: value.z }
    }
}

impl From<Vec3Data> for Vec3 {
    fn from(value: Vec3Data) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

/// On-disk layout of a profile. Field names are part of the file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFile {
    pub profile_name: String,
    pub left_quad_position: Vec3Data,
    pub left_quad_rotation: Vec3Data,
    pub left_quad_scale: Vec3Data,
    pub right_quad_position: Vec3Data,
    pub right_quad_rotation: Vec3Data,
    pub right_quad_scale: Vec3Data,
    #[serde(default = "SpeedConfig::default_position_speed")]
    pub position_speed: f32,
    #[serde(default = "SpeedConfig::default_rotation_speed")]
    pub rotation_speed: f32,
    #[serde(default = "SpeedConfig::default_scale_speed")]
    pub scale_speed: f32,
    #[serde(default = "SpeedConfig::default_depth_adjust_speed")]
    pub depth_adjust_speed: f32,
}

impl From<&Profile> for ProfileFile {
    fn from(profile: &Profile) -> Self {
        Self {
            profile_name: profile.name.clone(),
            left_quad_position: profile.left.position.into(),
            left_quad_rotation: profile.left.rotation.into(),
            left_quad_scale: profile.left.scale.into(),
            right_quad_position: profile.right.position.into(),
            right_quad_rotation: profile.right.rotation.into(),
            right_quad_scale: profile.right.scale.into(),
            position_speed: profile.speeds.position_speed,
            rotation_speed: profile.speeds.rotation_speed,
            scale_speed: profile.speeds.scale_speed,
            depth_adjust_speed: profile.speeds.depth_adjust_speed,
        }
    }
}

impl TryFrom<ProfileFile> for Profile {
    type Error = anyhow::Error;

    fn try_from(file: ProfileFile) -> Result<Self> {
        let name = file.profile_name.trim().to_string();
        if name.is_empty() {
            bail!("profileName is empty");
        }
        let left = Transform::new(
            file.left_quad_position.into(),
            file.left_quad_rotation.into(),
            file.left_quad_scale.into(),
        );
        let right = Transform::new(
            file.right_quad_position.into(),
            file.right_quad_rotation.into(),
            file.right_quad_scale.into(),
        );
        for (eye, transform) in [("left", &left), ("right", &right)] {
            if !Transform::scale_above_floor(transform.scale) {
                bail!("{eye} quad scale {:?} is below the scale floor", transform.scale);
            }
        }
        let speeds = SpeedConfig {
            position_speed: file.position_speed,
            rotation_speed: file.rotation_speed,
            scale_speed: file.scale_speed,
            depth_adjust_speed: file.depth_adjust_speed,
            ..SpeedConfig::default()
        }
        .clamped();
        Ok(Self { name, left, right, speeds })
    }
}

#[derive(Debug, Clone)]
pub struct SkippedProfile {
    pub path: PathBuf,
    pub reason: String,
}

/// What [`ProfileStore::load_all`] found.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub seeded_from_defaults: usize,
    pub synthesized_default: bool,
    pub skipped: Vec<SkippedProfile>,
}

/// Named profiles backed by one JSON file each under `root`.
///
/// `defaults_root` is a read-only set copied into `root` on first run. Writes are
/// synchronous and the store assumes it is the only writer.
pub struct ProfileStore {
    root: PathBuf,
    defaults_root: Option<PathBuf>,
    profiles: Vec<Profile>,
    // File each profile was read from or last written to, parallel to `profiles`.
    paths: Vec<PathBuf>,
    active: Option<usize>,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), defaults_root: None, profiles: Vec::new(), paths: Vec::new(), active: None }
    }

    pub fn with_defaults(mut self, defaults_root: impl Into<PathBuf>) -> Self {
        self.defaults_root = Some(defaults_root.into());
        self
    }

    /// A store holding only the built-in default, used when storage is unusable.
    pub fn in_memory_default(root: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(root);
        store.paths.push(store.path_for(DEFAULT_PROFILE_NAME));
        store.profiles.push(Profile::builtin_default());
        store.active = Some(0);
        store
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Profile> {
        self.active.and_then(|index| self.profiles.get(index))
    }

    pub fn find(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.name == name)
    }

    /// The file backing a loaded profile. It need not match [`ProfileStore::path_for`].
    pub fn source_path(&self, name: &str) -> Option<&Path> {
        let index = self.profiles.iter().position(|profile| profile.name == name)?;
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn ensure_root(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)
                .with_context(|| format!("Creating profile directory {}", self.root.display()))?;
        }
        Ok(())
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut file_name = name.trim().to_string();
        if file_name.is_empty() {
            file_name.push_str("profile");
        }
        let sanitized = file_name
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' { ch } else { '_' })
            .collect::<String>();
        self.root.join(format!("{sanitized}.{PROFILE_EXTENSION}"))
    }

    /// Reloads every profile from disk, seeding from the defaults directory or the
    /// built-in default when storage is empty. Files that fail to parse are skipped.
    pub fn load_all(&mut self) -> Result<LoadReport> {
        self.ensure_root()?;
        let mut report = LoadReport::default();
        self.load_directory(&mut report)?;
        if self.profiles.is_empty() {
            report.seeded_from_defaults = self.seed_from_defaults()?;
            if report.seeded_from_defaults > 0 {
                self.load_directory(&mut report)?;
            }
        }

        if self.profiles.is_empty() {
            // An unreadable Default.json stays on disk for inspection.
            let profile = Profile { name: self.unique_name(DEFAULT_PROFILE_NAME), ..Profile::builtin_default() };
            let path = self.save(&profile)?;
            log::info!("[profiles] No profiles found, created '{}'", profile.name);
            self.profiles.push(profile);
            self.paths.push(path);
            report.synthesized_default = true;
        }

        report.loaded = self.profiles.len();
        self.active = Some(0);
        Ok(report)
    }

    fn load_directory(&mut self, report: &mut LoadReport) -> Result<()> {
        self.profiles.clear();
        self.paths.clear();
        report.skipped.clear();
        for path in profile_files(&self.root)? {
            match Profile::load_from_path(&path) {
                Ok(profile) => {
                    if self.find(&profile.name).is_some() {
                        log::warn!(
                            "[profiles] {}: duplicate profile name '{}', skipping.",
                            path.display(),
                            profile.name
                        );
                        report.skipped.push(SkippedProfile {
                            path,
                            reason: format!("duplicate profile name '{}'", profile.name),
                        });
                        continue;
                    }
                    self.profiles.push(profile);
                    self.paths.push(path);
                }
                Err(err) => {
                    log::warn!("[profiles] Skipping unreadable profile: {err:#}");
                    report.skipped.push(SkippedProfile { path, reason: format!("{err:#}") });
                }
            }
        }
        Ok(())
    }

    fn seed_from_defaults(&self) -> Result<usize> {
        let Some(defaults_root) = self.defaults_root.as_ref() else {
            return Ok(0);
        };
        if !defaults_root.is_dir() {
            return Ok(0);
        }
        let mut copied = 0;
        for source in profile_files(defaults_root)? {
            let Some(file_name) = source.file_name() else {
                continue;
            };
            let destination = self.root.join(file_name);
            if destination.exists() {
                continue;
            }
            fs::copy(&source, &destination).with_context(|| {
                format!("Copying default profile {} to {}", source.display(), destination.display())
            })?;
            copied += 1;
        }
        if copied > 0 {
            log::info!("[profiles] Seeded {copied} profile(s) from {}", defaults_root.display());
        }
        Ok(copied)
    }

    /// Writes `profile` under its name, replacing any existing file.
    pub fn save(&self, profile: &Profile) -> Result<PathBuf> {
        self.ensure_root()?;
        let path = self.path_for(&profile.name);
        profile.save_to_path(&path)?;
        Ok(path)
    }

    /// Snapshots live state as a new profile, persists it and makes it active.
    /// A name already in use gets a numeric suffix.
    pub fn create_from_current(&mut self, name: &str, rig: &StereoRig, speeds: &SpeedConfig) -> Result<&Profile> {
        let name = self.unique_name(name);
        let profile = Profile::from_live(name, rig, speeds);
        let path = self.save(&profile)?;
        log::info!("[profiles] Created profile '{}'", profile.name);
        self.profiles.push(profile);
        self.paths.push(path);
        let index = self.profiles.len() - 1;
        self.active = Some(index);
        Ok(&self.profiles[index])
    }

    /// Overwrites the active profile with live state and persists it to the file it came from.
    pub fn save_current_into_active(&mut self, rig: &StereoRig, speeds: &SpeedConfig) -> Result<&Profile> {
        let index = self.active.ok_or_else(|| anyhow!("No active profile to save into"))?;
        let name = self.profiles[index].name.clone();
        let profile = Profile::from_live(name, rig, speeds);
        let path = self.paths.get(index).cloned().unwrap_or_else(|| self.path_for(&profile.name));
        self.ensure_root()?;
        profile.save_to_path(&path)?;
        self.profiles[index] = profile;
        log::info!("[profiles] Saved live state into '{}'", self.profiles[index].name);
        Ok(&self.profiles[index])
    }

    /// Advances the active profile circularly. Returns `None` when the list is empty.
    pub fn cycle(&mut self) -> Option<&Profile> {
        if self.profiles.is_empty() {
            log::warn!("[profiles] No profiles to cycle through");
            return None;
        }
        let next = self.active.map(|index| (index + 1) % self.profiles.len()).unwrap_or(0);
        self.active = Some(next);
        self.profiles.get(next)
    }

    pub fn activate(&mut self, name: &str) -> Option<&Profile> {
        let index = self.profiles.iter().position(|profile| profile.name == name)?;
        self.active = Some(index);
        self.profiles.get(index)
    }

    /// Copies a profile onto live state.
    pub fn apply(profile: &Profile, rig: &mut StereoRig, speeds: &mut SpeedConfig) {
        profile.apply_to(rig, speeds);
        log::debug!("[profiles] Applied '{}'", profile.name);
    }

    fn unique_name(&self, base: &str) -> String {
        let base = base.trim();
        let base = if base.is_empty() { "Profile" } else { base };
        if self.find(base).is_none() && !self.path_for(base).exists() {
            return base.to_string();
        }
        (2..)
            .map(|suffix| format!("{base}_{suffix}"))
            .find(|candidate| self.find(candidate).is_none() && !self.path_for(candidate).exists())
            .unwrap_or_else(|| base.to_string())
    }
}

/// Profile names derived from the local clock, e.g. `Calibration_20240131_154500`.
pub fn timestamped_name(prefix: &str) -> String {
    format!("{prefix}_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

fn profile_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Scanning profiles under {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(PROFILE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_format_uses_camel_case_keys() {
        let json = Profile::builtin_default().to_json().expect("encode");
        for key in ["profileName", "leftQuadPosition", "rightQuadScale", "depthAdjustSpeed"] {
            assert!(json.contains(key), "missing key {key} in {json}");
        }
    }

    #[test]
    fn missing_speeds_fall_back_to_defaults() {
        let json = r#"{
            "profileName": "Sparse",
            "leftQuadPosition": {"x": 0.0, "y": 0.0, "z": 1.0},
            "leftQuadRotation": {"x": 0.0, "y": 180.0, "z": 0.0},
            "leftQuadScale": {"x": 1.0, "y": 1.0, "z": 1.0},
            "rightQuadPosition": {"x": 0.0, "y": 0.0, "z": 1.0},
            "rightQuadRotation": {"x": 0.0, "y": 180.0, "z": 0.0},
            "rightQuadScale": {"x": 1.0, "y": 1.0, "z": 1.0},
            "rotationSpeed": 500.0
        }"#;
        let profile = Profile::from_json(json).expect("decode");
        assert_eq!(profile.speeds.position_speed, SpeedConfig::default_position_speed());
        assert_eq!(profile.speeds.rotation_speed, 10.0, "out-of-range speeds are clamped");
    }

    #[test]
    fn path_for_sanitizes_names() {
        let store = ProfileStore::new("/tmp/profiles");
        assert_eq!(store.path_for("My Profile/1"), PathBuf::from("/tmp/profiles/My_Profile_1.json"));
        assert_eq!(store.path_for("  "), PathBuf::from("/tmp/profiles/profile.json"));
    }
}
