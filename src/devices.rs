use crate::input::InputSnapshot;
use crate::surface::Eye;
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceChanges {
    pub connected: SmallVec<[Eye; 2]>,
    pub disconnected: SmallVec<[Eye; 2]>,
}

impl DeviceChanges {
    pub fn is_empty(&self) -> bool {
        self.connected.is_empty() && self.disconnected.is_empty()
    }
}

/// Which controllers are present, re-checked every tick.
///
/// Nothing is adjusted until both hands report in; a controller that drops out is
/// picked up again on the first tick it reappears.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    connected: [bool; 2],
    waiting_ticks: u64,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, snapshot: &InputSnapshot) -> DeviceChanges {
        let mut changes = DeviceChanges::default();
        for hand in Eye::BOTH {
            let present = snapshot.controller(hand).is_some();
            let slot = &mut self.connected[hand.index()];
            if present == *slot {
                continue;
            }
            *slot = present;
            if present {
                log::info!("[devices] {} controller connected", hand.label());
                changes.connected.push(hand);
            } else {
                log::warn!("[devices] {} controller lost, waiting for it to return", hand.label());
                changes.disconnected.push(hand);
            }
        }
        if self.ready() {
            self.waiting_ticks = 0;
        } else {
            self.waiting_ticks += 1;
        }
        changes
    }

    pub fn is_connected(&self, hand: Eye) -> bool {
        self.connected[hand.index()]
    }

    pub fn ready(&self) -> bool {
        self.connected.iter().all(|connected| *connected)
    }

    /// Consecutive ticks spent without both controllers.
    pub fn waiting_ticks(&self) -> u64 {
        self.waiting_ticks
    }
}
