use crate::surface::Eye;
use bitflags::bitflags;
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// True only on the frame a button goes down.
pub fn pressed_this_frame(previous: bool, current: bool) -> bool {
    current && !previous
}

/// True only on the frame a button comes back up.
pub fn released_this_frame(previous: bool, current: bool) -> bool {
    !current && previous
}

/// Zeroes each axis independently when its magnitude is under `deadzone`.
/// Values at or above the threshold pass through unscaled.
pub fn apply_deadzone(stick: Vec2, deadzone: f32) -> Vec2 {
    let filter = |v: f32| if v.abs() < deadzone { 0.0 } else { v };
    Vec2::new(filter(stick.x), filter(stick.y))
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const PRIMARY = 1 << 0;
        const SECONDARY = 1 << 1;
        const GRIP = 1 << 2;
        const TRIGGER = 1 << 3;
        const MENU = 1 << 4;
        const STICK_CLICK = 1 << 5;
    }
}

impl Buttons {
    fn from_binding_name(name: &str) -> Option<Self> {
        match name {
            "primary" | "a" | "x" => Some(Buttons::PRIMARY),
            "secondary" | "b" | "y" => Some(Buttons::SECONDARY),
            "grip" => Some(Buttons::GRIP),
            "trigger" => Some(Buttons::TRIGGER),
            "menu" => Some(Buttons::MENU),
            "stick_click" | "thumbstick" => Some(Buttons::STICK_CLICK),
            _ => None,
        }
    }
}

/// World pose of a tracked controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Quat::IDENTITY }
    }
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// Already-debounced feature values for one controller on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSnapshot {
    pub primary: bool,
    pub secondary: bool,
    pub grip: bool,
    pub menu: bool,
    pub stick_click: bool,
    pub trigger: f32,
    pub stick: Vec2,
    pub pose: Pose,
}

impl ControllerSnapshot {
    pub fn buttons(&self, trigger_press_threshold: f32) -> Buttons {
        let mut buttons = Buttons::empty();
        buttons.set(Buttons::PRIMARY, self.primary);
        buttons.set(Buttons::SECONDARY, self.secondary);
        buttons.set(Buttons::GRIP, self.grip);
        buttons.set(Buttons::TRIGGER, self.trigger > trigger_press_threshold);
        buttons.set(Buttons::MENU, self.menu);
        buttons.set(Buttons::STICK_CLICK, self.stick_click);
        buttons
    }
}

/// Both controllers for one frame. `None` means the device is not available.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSnapshot {
    #[serde(default)]
    pub left: Option<ControllerSnapshot>,
    #[serde(default)]
    pub right: Option<ControllerSnapshot>,
}

impl InputSnapshot {
    pub fn both(left: ControllerSnapshot, right: ControllerSnapshot) -> Self {
        Self { left: Some(left), right: Some(right) }
    }

    pub fn controller(&self, hand: Eye) -> Option<&ControllerSnapshot> {
        match hand {
            Eye::Left => self.left.as_ref(),
            Eye::Right => self.right.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonEdges {
    pub pressed: Buttons,
    pub released: Buttons,
    pub held: Buttons,
}

/// Keeps the previous-frame bit for every button of one controller.
#[derive(Debug, Clone, Default)]
pub struct ButtonTracker {
    previous: Option<Buttons>,
}

impl ButtonTracker {
    pub fn update(&mut self, current: Buttons) -> ButtonEdges {
        // First frame after (re)connect only records state.
        let previous = self.previous.unwrap_or(current);
        self.previous = Some(current);
        let mut edges = ButtonEdges { held: current, ..Default::default() };
        for button in Buttons::all().iter() {
            let was = previous.contains(button);
            let is = current.contains(button);
            edges.pressed.set(button, pressed_this_frame(was, is));
            edges.released.set(button, released_this_frame(was, is));
        }
        edges
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Actions: u16 {
        const CYCLE_MODE_LEFT = 1 << 0;
        const CYCLE_MODE_RIGHT = 1 << 1;
        const CONFIRM = 1 << 2;
        const CANCEL = 1 << 3;
        const CALIBRATE = 1 << 4;
        const SAVE_PROFILE = 1 << 5;
        const CYCLE_PROFILE = 1 << 6;
        const CREATE_PROFILE = 1 << 7;
        const RESET_SURFACES = 1 << 8;
    }
}

impl Actions {
    pub const PROFILE_ACTIONS: Actions = Actions::SAVE_PROFILE
        .union(Actions::CYCLE_PROFILE)
        .union(Actions::CREATE_PROFILE)
        .union(Actions::RESET_SURFACES);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    CycleModeLeft,
    CycleModeRight,
    Confirm,
    Cancel,
    Calibrate,
    SaveProfile,
    CycleProfile,
    CreateProfile,
    ResetSurfaces,
}

impl InputAction {
    pub const ALL: [InputAction; 9] = [
        InputAction::CycleModeLeft,
        InputAction::CycleModeRight,
        InputAction::Confirm,
        InputAction::Cancel,
        InputAction::Calibrate,
        InputAction::SaveProfile,
        InputAction::CycleProfile,
        InputAction::CreateProfile,
        InputAction::ResetSurfaces,
    ];

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "cycle_mode_left" => Some(Self::CycleModeLeft),
            "cycle_mode_right" => Some(Self::CycleModeRight),
            "confirm" => Some(Self::Confirm),
            "cancel" => Some(Self::Cancel),
            "calibrate" => Some(Self::Calibrate),
            "save_profile" => Some(Self::SaveProfile),
            "cycle_profile" => Some(Self::CycleProfile),
            "create_profile" => Some(Self::CreateProfile),
            "reset_surfaces" => Some(Self::ResetSurfaces),
            _ => None,
        }
    }

    pub fn flag(self) -> Actions {
        match self {
            Self::CycleModeLeft => Actions::CYCLE_MODE_LEFT,
            Self::CycleModeRight => Actions::CYCLE_MODE_RIGHT,
            Self::Confirm => Actions::CONFIRM,
            Self::Cancel => Actions::CANCEL,
            Self::Calibrate => Actions::CALIBRATE,
            Self::SaveProfile => Actions::SAVE_PROFILE,
            Self::CycleProfile => Actions::CYCLE_PROFILE,
            Self::CreateProfile => Actions::CREATE_PROFILE,
            Self::ResetSurfaces => Actions::RESET_SURFACES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ButtonBinding {
    hand: Eye,
    button: Buttons,
}

impl ButtonBinding {
    fn new(hand: Eye, button: Buttons) -> Self {
        Self { hand, button }
    }
}

/// One or more buttons that must be held together. A single-button chord is a plain press.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Chord {
    buttons: SmallVec<[ButtonBinding; 2]>,
}

impl Chord {
    fn single(hand: Eye, button: Buttons) -> Self {
        Self { buttons: smallvec![ButtonBinding::new(hand, button)] }
    }

    fn pair(first: ButtonBinding, second: ButtonBinding) -> Self {
        Self { buttons: smallvec![first, second] }
    }

    fn from_config_value(raw: &str) -> Result<Self, ()> {
        let mut buttons = SmallVec::new();
        for part in raw.split('+') {
            let normalized = part.trim().to_lowercase();
            let (hand, button) = normalized.split_once('.').ok_or(())?;
            let hand = match hand {
                "left" | "l" => Eye::Left,
                "right" | "r" => Eye::Right,
                _ => return Err(()),
            };
            let button = Buttons::from_binding_name(button).ok_or(())?;
            buttons.push(ButtonBinding::new(hand, button));
        }
        if buttons.is_empty() {
            return Err(());
        }
        Ok(Self { buttons })
    }

    fn held(&self, edges: &[ButtonEdges; 2]) -> bool {
        self.buttons.iter().all(|b| edges[b.hand.index()].held.contains(b.button))
    }

    /// Fires on the frame the last button of the chord goes down.
    fn fired(&self, edges: &[ButtonEdges; 2]) -> bool {
        self.held(edges) && self.buttons.iter().any(|b| edges[b.hand.index()].pressed.contains(b.button))
    }
}

#[derive(Debug, Clone)]
pub struct InputBindings {
    action_to_chords: HashMap<InputAction, Vec<Chord>>,
}

impl InputBindings {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents, &path.display().to_string()),
            Err(err) => {
                log::warn!(
                    "[input] Failed to read {}: {err}. Falling back to default bindings.",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn from_json(contents: &str, origin: &str) -> Self {
        match serde_json::from_str::<InputConfigFile>(contents) {
            Ok(config) => Self::with_overrides(config.into_overrides(origin)),
            Err(err) => {
                log::warn!("[input] Failed to parse {origin}: {err}. Falling back to default bindings.");
                Self::default()
            }
        }
    }

    fn with_overrides(overrides: HashMap<InputAction, Vec<Chord>>) -> Self {
        let mut action_to_chords = Self::default_action_map();
        for (action, chords) in overrides {
            if chords.is_empty() {
                continue;
            }
            action_to_chords.insert(action, chords);
        }
        Self { action_to_chords }
    }

    fn default_action_map() -> HashMap<InputAction, Vec<Chord>> {
        use InputAction::*;
        let mut map = HashMap::new();
        map.insert(CycleModeLeft, vec![Chord::single(Eye::Left, Buttons::PRIMARY)]);
        map.insert(CycleModeRight, vec![Chord::single(Eye::Right, Buttons::PRIMARY)]);
        map.insert(Confirm, vec![Chord::single(Eye::Right, Buttons::SECONDARY)]);
        map.insert(Cancel, vec![Chord::single(Eye::Left, Buttons::SECONDARY)]);
        map.insert(Calibrate, vec![Chord::single(Eye::Left, Buttons::MENU)]);
        map.insert(SaveProfile, vec![Chord::single(Eye::Right, Buttons::SECONDARY)]);
        map.insert(CycleProfile, vec![Chord::single(Eye::Left, Buttons::SECONDARY)]);
        map.insert(CreateProfile, vec![Chord::single(Eye::Right, Buttons::MENU)]);
        map.insert(
            ResetSurfaces,
            vec![Chord::pair(
                ButtonBinding::new(Eye::Left, Buttons::STICK_CLICK),
                ButtonBinding::new(Eye::Right, Buttons::STICK_CLICK),
            )],
        );
        map
    }

    fn chords(&self, action: InputAction) -> impl Iterator<Item = &Chord> + '_ {
        self.action_to_chords.get(&action).into_iter().flatten()
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self { action_to_chords: Self::default_action_map() }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<InputAction, Vec<Chord>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let action_key = action_name.trim().to_lowercase();
            let Some(action) = InputAction::from_str(&action_key) else {
                log::warn!("[input] {origin}: unknown action '{action_name}', ignoring.");
                continue;
            };
            let mut parsed = Vec::new();
            for key in keys {
                match Chord::from_config_value(&key) {
                    Ok(chord) => parsed.push(chord),
                    Err(_) => {
                        log::warn!("[input] {origin}: unknown button '{key}' for action '{action_name}', ignoring.")
                    }
                }
            }
            if parsed.is_empty() {
                log::warn!("[input] {origin}: action '{action_name}' has no valid buttons, keeping defaults.");
                continue;
            }
            overrides.insert(action, parsed);
        }
        overrides
    }
}

/// Per-frame action state derived from both controllers.
///
/// Edge-triggered actions are consumed with [`Input::take`]; anything not taken
/// is dropped by [`Input::clear_frame`].
pub struct Input {
    bindings: InputBindings,
    trackers: [ButtonTracker; 2],
    edges: [ButtonEdges; 2],
    pressed: Actions,
    held: Actions,
}

impl Input {
    pub fn new(bindings: InputBindings) -> Self {
        Self {
            bindings,
            trackers: [ButtonTracker::default(), ButtonTracker::default()],
            edges: [ButtonEdges::default(); 2],
            pressed: Actions::empty(),
            held: Actions::empty(),
        }
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        Self::new(InputBindings::load_or_default(path))
    }

    /// Samples both controllers and resolves bindings into actions.
    pub fn update(&mut self, left: &ControllerSnapshot, right: &ControllerSnapshot, trigger_threshold: f32) {
        self.edges[0] = self.trackers[0].update(left.buttons(trigger_threshold));
        self.edges[1] = self.trackers[1].update(right.buttons(trigger_threshold));
        self.pressed = Actions::empty();
        self.held = Actions::empty();
        for action in InputAction::ALL {
            let flag = action.flag();
            for chord in self.bindings.chords(action) {
                if chord.fired(&self.edges) {
                    self.pressed |= flag;
                }
                if chord.held(&self.edges) {
                    self.held |= flag;
                }
            }
        }
    }

    /// Forgets previous button state so a reconnecting controller cannot produce stale edges.
    pub fn reset_hand(&mut self, hand: Eye) {
        self.trackers[hand.index()].reset();
        self.edges[hand.index()] = ButtonEdges::default();
    }

    pub fn take(&mut self, action: InputAction) -> bool {
        let flag = action.flag();
        let was = self.pressed.contains(flag);
        self.pressed.remove(flag);
        was
    }

    pub fn peek(&self, action: InputAction) -> bool {
        self.pressed.contains(action.flag())
    }

    pub fn held(&self, action: InputAction) -> bool {
        self.held.contains(action.flag())
    }

    /// Drops pending presses without acting on them.
    pub fn suppress(&mut self, actions: Actions) {
        self.pressed.remove(actions);
    }

    pub fn clear_frame(&mut self) {
        self.pressed = Actions::empty();
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new(InputBindings::default())
    }
}
