//! Input Capture
//!
//! Digital per-frame input: four direction keys, a place-bomb trigger
//! and a restart trigger, packed into one byte. Opposing keys cancel.
//!
//! Inputs are recorded delta-compressed per player so a round can be
//! replayed frame by frame.

use serde::{Serialize, Deserialize};

use crate::game::state::PlayerId;

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Raw input state for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct InputFrame {
    /// Packed key bits:
    /// - Bit 0: up held
    /// - Bit 1: down held
    /// - Bit 2: left held
    /// - Bit 3: right held
    /// - Bit 4: place bomb pressed this frame
    /// - Bit 5: restart pressed this frame (only honoured between rounds)
    /// - Bit 6-7: Reserved
    pub flags: u8,
}

impl InputFrame {
    /// Up key bit
    pub const UP: u8 = 0x01;

    /// Down key bit
    pub const DOWN: u8 = 0x02;

    /// Left key bit
    pub const LEFT: u8 = 0x04;

    /// Right key bit
    pub const RIGHT: u8 = 0x08;

    /// Place-bomb bit (edge triggered by the driver)
    pub const PLACE_BOMB: u8 = 0x10;

    /// Restart bit (edge triggered by the driver)
    pub const RESTART: u8 = 0x20;

    /// Create a new empty input frame.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Create input from raw bits.
    pub const fn from_flags(flags: u8) -> Self {
        Self { flags }
    }

    /// Create input from move axes (each clamped to -1..=1).
    pub fn with_axes(x: i8, y: i8) -> Self {
        let mut flags = 0;
        match x.signum() {
            1 => flags |= Self::RIGHT,
            -1 => flags |= Self::LEFT,
            _ => {}
        }
        match y.signum() {
            1 => flags |= Self::UP,
            -1 => flags |= Self::DOWN,
            _ => {}
        }
        Self { flags }
    }

    #[inline]
    fn held(&self, bit: u8) -> bool {
        self.flags & bit != 0
    }

    /// Movement axes, each in {-1, 0, 1}.
    #[inline]
    pub fn move_axes(&self) -> (i8, i8) {
        let x = self.held(Self::RIGHT) as i8 - self.held(Self::LEFT) as i8;
        let y = self.held(Self::UP) as i8 - self.held(Self::DOWN) as i8;
        (x, y)
    }

    /// Check if place-bomb was pressed this frame.
    #[inline]
    pub fn place_pressed(&self) -> bool {
        self.held(Self::PLACE_BOMB)
    }

    /// Set place-bomb flag.
    #[inline]
    pub fn set_place(&mut self, pressed: bool) {
        if pressed {
            self.flags |= Self::PLACE_BOMB;
        } else {
            self.flags &= !Self::PLACE_BOMB;
        }
    }

    /// Check if restart was pressed this frame.
    #[inline]
    pub fn restart_pressed(&self) -> bool {
        self.held(Self::RESTART)
    }

    /// Set restart flag.
    #[inline]
    pub fn set_restart(&mut self, pressed: bool) {
        if pressed {
            self.flags |= Self::RESTART;
        } else {
            self.flags &= !Self::RESTART;
        }
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }
}

/// Sprite rotation in degrees for the given move axes.
///
/// None when idle. 0 faces up, 90 left, 180 down, -90 right.
pub fn facing_angle(x: i8, y: i8) -> Option<i32> {
    let x = i32::from(x.signum());
    let y = i32::from(y.signum());
    let horizontal = 90 * -x;
    let vertical = 90 + 90 * -y;

    match (x, y) {
        (0, 0) => None,
        (_, 0) => Some(horizontal),
        (0, _) => Some(vertical),
        _ => {
            let wrap = if x > 0 && y < 0 { 180 } else { 0 };
            Some((horizontal + vertical) / 2 - wrap)
        }
    }
}

/// Input that took effect from a given frame on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Frame when this input state began
    pub frame: u32,
    /// The new input state
    pub input: InputFrame,
}

// =============================================================================
// INPUT BUFFER
// =============================================================================

/// Complete input recording for one player in one round.
///
/// Only frames where input CHANGED are stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerInputBuffer {
    /// Player identifier
    pub player_id: PlayerId,

    /// Last frame recorded
    pub end_frame: u32,

    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_input: InputFrame,
}

impl PlayerInputBuffer {
    /// Create a new input buffer for a player.
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            end_frame: 0,
            deltas: Vec::new(),
            last_input: InputFrame::new(),
        }
    }

    /// Record input for a frame.
    pub fn record(&mut self, frame: u32, input: InputFrame) {
        self.end_frame = frame;

        if input != self.last_input {
            self.deltas.push(InputDelta { frame, input });
            self.last_input = input;
        }
    }

    /// Input in effect at `frame`.
    pub fn input_at(&self, frame: u32) -> InputFrame {
        // Last delta at or before this frame
        let idx = self.deltas.partition_point(|d| d.frame <= frame);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].input
        }
    }

    /// Stored changes.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
