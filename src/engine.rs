use crate::adjust::{adjust_surface, AdjustmentMode, EyeModes};
use crate::calibration::{CalibrationPhase, CalibrationWorkflow, LongPressTracker, PressKind, WorkflowOutcome};
use crate::config::{EngineConfig, SpeedConfig, SpeedField};
use crate::devices::DeviceRegistry;
use crate::grab::{manipulate_with_grip, GrabRule, GrabState, GrabUpdate};
use crate::input::{apply_deadzone, Actions, Input, InputAction, InputBindings, InputSnapshot};
use crate::profile::{timestamped_name, LoadReport, ProfileStore};
use crate::status::{StatusFeed, StatusRecord};
use crate::surface::{Eye, StereoRig};

/// The calibration core. The host calls [`Engine::tick`] once per frame.
pub struct Engine {
    config: EngineConfig,
    rig: StereoRig,
    speeds: SpeedConfig,
    modes: EyeModes,
    grabs: [GrabState; 2],
    grab_rule: GrabRule,
    workflow: CalibrationWorkflow,
    calibrate_press: LongPressTracker,
    input: Input,
    devices: DeviceRegistry,
    store: ProfileStore,
    load_report: LoadReport,
    hud_visible: bool,
    feed: StatusFeed,
    dirty: bool,
}

impl Engine {
    /// Loads bindings and profiles and applies the first profile to the surfaces.
    ///
    /// Storage problems never fail initialisation: the engine logs them and runs on an
    /// in-memory built-in profile instead.
    pub fn init(config: EngineConfig) -> Self {
        let bindings = match config.bindings_path.as_ref() {
            Some(path) => InputBindings::load_or_default(path),
            None => InputBindings::default(),
        };
        let mut store =
            ProfileStore::new(config.profiles_dir.clone()).with_defaults(config.default_profiles_dir.clone());
        let load_report = match store.load_all() {
            Ok(report) => {
                for skipped in &report.skipped {
                    log::warn!("[engine] Profile {} skipped: {}", skipped.path.display(), skipped.reason);
                }
                report
            }
            Err(err) => {
                log::warn!("[engine] Profile storage unavailable ({err:#}); using the built-in default in memory");
                store = ProfileStore::in_memory_default(config.profiles_dir.clone());
                LoadReport { loaded: 1, synthesized_default: true, ..Default::default() }
            }
        };

        let mut rig = StereoRig::new();
        let mut speeds = config.speeds.clamped();
        if let Some(profile) = store.active() {
            ProfileStore::apply(profile, &mut rig, &mut speeds);
            log::info!("[engine] Active profile '{}'", profile.name);
        }

        let grab_rule = GrabRule {
            trigger_threshold: config.grab_trigger_threshold,
            requires_trigger: config.grab_requires_trigger,
        };
        let mut engine = Self {
            config,
            rig,
            speeds,
            modes: EyeModes::default(),
            grabs: [GrabState::default(); 2],
            grab_rule,
            workflow: CalibrationWorkflow::new(),
            calibrate_press: LongPressTracker::default(),
            input: Input::new(bindings),
            devices: DeviceRegistry::new(),
            store,
            load_report,
            hud_visible: true,
            feed: StatusFeed::default(),
            dirty: true,
        };
        engine.flush();
        engine
    }

    /// Advances the engine by one frame.
    pub fn tick(&mut self, snapshot: &InputSnapshot, dt: f32) {
        let changes = self.devices.refresh(snapshot);
        for hand in changes.connected.iter().chain(changes.disconnected.iter()) {
            self.input.reset_hand(*hand);
            if self.grabs[hand.index()].is_grabbed() {
                self.grabs[hand.index()].release();
            }
        }
        if !changes.is_empty() {
            self.calibrate_press.reset();
            self.dirty = true;
        }
        let (Some(left), Some(right)) = (snapshot.left.as_ref(), snapshot.right.as_ref()) else {
            self.flush();
            return;
        };

        self.input.update(left, right, self.config.trigger_press_threshold);
        self.handle_calibrate_button(dt);

        if self.workflow.phase().is_idle() {
            self.input.suppress(Actions::CONFIRM | Actions::CANCEL);
            self.handle_profile_actions();
        } else {
            self.input.suppress(Actions::PROFILE_ACTIONS);
            if self.input.take(InputAction::Confirm) {
                self.confirm_calibration();
            } else if self.input.take(InputAction::Cancel) {
                self.cancel_calibration();
            }
        }

        if self.workflow.allows_adjustment() {
            for eye in Eye::BOTH {
                if self.input.take(cycle_action(eye)) {
                    let mode = self.modes.cycle(eye);
                    log::debug!("[engine] {} eye mode -> {}", eye.label(), mode.label());
                    self.dirty = true;
                }
            }
            for eye in Eye::BOTH {
                let controller = if eye == Eye::Left { left } else { right };
                let surface = self.rig.surface_mut(eye);
                let update = manipulate_with_grip(controller, &self.grab_rule, surface, &mut self.grabs[eye.index()]);
                if update != GrabUpdate::Idle {
                    self.dirty = true;
                }
                if update.is_active() {
                    continue;
                }
                let stick = apply_deadzone(controller.stick, self.speeds.deadzone);
                if adjust_surface(surface, self.modes.get(eye), stick, &self.speeds) {
                    self.dirty = true;
                }
            }
        } else {
            self.release_grabs();
        }

        self.input.clear_frame();
        self.flush();
    }

    /// Ends the session. An unfinished calibration is cancelled.
    pub fn shutdown(mut self) -> StatusRecord {
        if !self.workflow.phase().is_idle() {
            log::info!("[engine] Shutting down with calibration open, cancelling it");
            self.cancel_calibration();
        }
        self.status()
    }

    fn handle_calibrate_button(&mut self, dt: f32) {
        let held = self.input.held(InputAction::Calibrate);
        self.input.take(InputAction::Calibrate);
        match self.calibrate_press.update(held, dt, self.config.long_press_seconds) {
            Some(PressKind::Long) => {
                self.begin_calibration();
            }
            Some(PressKind::Short) => {
                self.hud_visible = !self.hud_visible;
                self.dirty = true;
            }
            None => {}
        }
    }

    fn handle_profile_actions(&mut self) {
        if self.input.take(InputAction::ResetSurfaces) {
            self.reset_surfaces();
        }
        if self.input.take(InputAction::CycleProfile) {
            self.cycle_profile();
        }
        if self.input.take(InputAction::SaveProfile) {
            self.save_active_profile();
        }
        if self.input.take(InputAction::CreateProfile) {
            self.create_profile();
        }
    }

    /// `Idle -> ShowingInstructions`.
    pub fn begin_calibration(&mut self) -> bool {
        let shown = self.workflow.show_instructions() == WorkflowOutcome::InstructionsShown;
        if shown {
            self.release_grabs();
            self.dirty = true;
        }
        self.flush();
        shown
    }

    /// Starts the alignment from the instructions screen, or commits a running session
    /// into a new active profile.
    pub fn confirm_calibration(&mut self) -> WorkflowOutcome {
        let outcome = self.workflow.confirm(&mut self.rig, &mut self.modes, self.config.calibration_separation);
        match outcome {
            WorkflowOutcome::Started => self.release_grabs(),
            WorkflowOutcome::Committed => {
                let name = timestamped_name("Calibration");
                if let Err(err) = self.store.create_from_current(&name, &self.rig, &self.speeds) {
                    log::warn!("[engine] Could not store calibration profile '{name}': {err:#}");
                }
            }
            _ => {}
        }
        if outcome != WorkflowOutcome::Ignored {
            self.dirty = true;
        }
        self.flush();
        outcome
    }

    pub fn cancel_calibration(&mut self) -> WorkflowOutcome {
        let outcome = self.workflow.cancel(&mut self.rig, &mut self.modes, self.config.cancel_policy);
        if outcome == WorkflowOutcome::RolledBack {
            self.release_grabs();
        }
        if outcome != WorkflowOutcome::Ignored {
            self.dirty = true;
        }
        self.flush();
        outcome
    }

    /// Nudges one speed field, saturating at its range.
    pub fn adjust_speed(&mut self, field: SpeedField, delta: f32) -> bool {
        let changed = self.speeds.adjust(field, delta);
        if changed {
            self.dirty = true;
        }
        self.flush();
        changed
    }

    pub fn set_mode(&mut self, eye: Eye, mode: AdjustmentMode) {
        if self.modes.get(eye) != mode {
            self.modes.set(eye, mode);
            self.dirty = true;
        }
        self.flush();
    }

    /// Restores both surfaces to the compiled-in default pose.
    pub fn reset_surfaces(&mut self) {
        self.rig.reset_to_defaults();
        self.release_grabs();
        self.dirty = true;
        log::info!("[engine] Surfaces reset to defaults");
        self.flush();
    }

    /// Makes the named profile active and applies it.
    pub fn apply_profile(&mut self, name: &str) -> bool {
        let Some(profile) = self.store.activate(name) else {
            log::warn!("[engine] No profile named '{name}'");
            return false;
        };
        ProfileStore::apply(profile, &mut self.rig, &mut self.speeds);
        self.release_grabs();
        self.dirty = true;
        self.flush();
        true
    }

    /// Advances to the next profile and applies it. Returns its name.
    pub fn cycle_profile(&mut self) -> Option<String> {
        let profile = self.store.cycle()?;
        ProfileStore::apply(profile, &mut self.rig, &mut self.speeds);
        let name = profile.name.clone();
        log::info!("[engine] Switched to profile '{name}'");
        self.release_grabs();
        self.dirty = true;
        self.flush();
        Some(name)
    }

    pub fn save_active_profile(&mut self) -> bool {
        let saved = match self.store.save_current_into_active(&self.rig, &self.speeds) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("[engine] Saving active profile failed: {err:#}");
                false
            }
        };
        if saved {
            self.dirty = true;
        }
        self.flush();
        saved
    }

    /// Snapshots live state into a new timestamp-named profile and makes it active.
    pub fn create_profile(&mut self) -> Option<String> {
        self.create_profile_named(&timestamped_name("Profile"))
    }

    pub fn create_profile_named(&mut self, name: &str) -> Option<String> {
        let created = match self.store.create_from_current(name, &self.rig, &self.speeds) {
            Ok(profile) => Some(profile.name.clone()),
            Err(err) => {
                log::warn!("[engine] Creating profile '{name}' failed: {err:#}");
                None
            }
        };
        if created.is_some() {
            self.dirty = true;
        }
        self.flush();
        created
    }

    pub fn status(&self) -> StatusRecord {
        StatusRecord {
            left_mode: self.modes.get(Eye::Left),
            right_mode: self.modes.get(Eye::Right),
            speeds: self.speeds,
            phase: self.workflow.phase(),
            active_profile: self.store.active().map(|profile| profile.name.clone()),
            hud_visible: self.hud_visible,
            left_grabbed: self.grabs[Eye::Left.index()].is_grabbed(),
            right_grabbed: self.grabs[Eye::Right.index()].is_grabbed(),
            devices_ready: self.devices.ready(),
        }
    }

    /// Takes every record emitted since the last drain, oldest first. Only the
    /// newest [`crate::status::STATUS_FEED_CAPACITY`] records are kept between drains.
    pub fn drain_status(&mut self) -> Vec<StatusRecord> {
        self.feed.drain()
    }

    pub fn rig(&self) -> &StereoRig {
        &self.rig
    }

    pub fn speeds(&self) -> &SpeedConfig {
        &self.speeds
    }

    pub fn mode(&self, eye: Eye) -> AdjustmentMode {
        self.modes.get(eye)
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.workflow.phase()
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn hud_visible(&self) -> bool {
        self.hud_visible
    }

    pub fn is_grabbed(&self, eye: Eye) -> bool {
        self.grabs[eye.index()].is_grabbed()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn release_grabs(&mut self) {
        for grab in &mut self.grabs {
            if grab.is_grabbed() {
                grab.release();
                self.dirty = true;
            }
        }
    }

    fn flush(&mut self) {
        if self.dirty {
            self.dirty = false;
            let record = self.status();
            log::debug!("[status] {record}");
            self.feed.push(record);
        }
    }
}

fn cycle_action(eye: Eye) -> InputAction {
    match eye {
        Eye::Left => InputAction::CycleModeLeft,
        Eye::Right => InputAction::CycleModeRight,
    }
}
