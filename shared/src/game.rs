//! Replay model consumed by the encoder.
//!
//! The encoder never parses replays itself; it reads whatever the replay
//! reader produced through the [`ReplayModel`] trait. Every field is optional
//! and independently present or absent, so a partially populated model still
//! encodes (absent fields keep their schema defaults).
//!
//! [`Game`] is a plain implementation of the trait that deserializes from a
//! JSON model dump.

use serde::{Deserialize, Serialize};

use crate::slp_format::MAX_PORTS;

/// Read-only capability interface over a parsed replay.
pub trait ReplayModel {
    /// Match-start metadata, if the reader produced any
    fn start(&self) -> Option<&GameStart>;

    /// Frames in playback order (possibly empty)
    fn frames(&self) -> &[Frame];

    /// Match-end metadata, if the match finished cleanly
    fn end(&self) -> Option<&GameEnd>;

    /// Build version string reported by the recording client (e.g. "3.4.0")
    fn build_version(&self) -> Option<&str> {
        self.start().and_then(|s| s.slippi_version.as_deref())
    }
}

/// Complete replay model (in-memory representation)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub start: Option<GameStart>,
    pub frames: Vec<Frame>,
    pub end: Option<GameEnd>,
}

impl Game {
    /// Parse a model dump from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl ReplayModel for Game {
    fn start(&self) -> Option<&GameStart> {
        self.start.as_ref()
    }

    fn frames(&self) -> &[Frame] {
        &self.frames
    }

    fn end(&self) -> Option<&GameEnd> {
        self.end.as_ref()
    }
}

/// Match-start metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStart {
    /// Dotted build version of the recording client
    pub slippi_version: Option<String>,
    pub is_teams: Option<bool>,
    pub is_pal: Option<bool>,
    pub is_frozen_ps: Option<bool>,
    pub stage: Option<u16>,
    pub random_seed: Option<u32>,
    /// Per-port player info; `None` for an empty port
    pub players: [Option<Player>; MAX_PORTS],
}

/// One occupied port at match start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    /// External character id
    pub character: Option<u8>,
    pub costume: Option<u8>,
    pub stocks: Option<u8>,
    pub team: Option<u8>,
    /// Name tag shown above the character
    pub tag: Option<String>,
    /// Human / CPU / demo
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub ucf: Option<UcfToggles>,
}

/// Dash-back and shield-drop fix settings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UcfToggles {
    pub dash_back: Option<u32>,
    pub shield_drop: Option<u32>,
}

/// Match-end metadata
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameEnd {
    pub method: Option<u8>,
    /// Port that quit out, -1 when nobody did
    pub lras_initiator: Option<i8>,
}

/// One frame of per-port data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    /// Frame index (negative during the countdown)
    pub index: i32,
    pub ports: [Option<PortFrame>; MAX_PORTS],
}

/// Data for one port on one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortFrame {
    pub leader: EntityFrame,
    /// Secondary character (e.g. the partner of a paired climber)
    pub follower: Option<EntityFrame>,
}

/// Pre/post records for one entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFrame {
    pub pre: Option<PreFrame>,
    pub post: Option<PostFrame>,
}

/// State captured before the frame is simulated
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreFrame {
    pub random_seed: Option<u32>,
    pub state: Option<u16>,
    pub position: Option<Position>,
    pub direction: Option<f32>,
    pub joystick: Option<Position>,
    pub cstick: Option<Position>,
    pub trigger: Option<f32>,
    pub buttons: Option<u32>,
    pub damage: Option<f32>,
}

/// State captured after the frame is simulated
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFrame {
    /// Internal character id
    pub character: Option<u8>,
    pub state: Option<u16>,
    pub position: Option<Position>,
    pub direction: Option<f32>,
    pub damage: Option<f32>,
    pub shield: Option<f32>,
    pub last_attack_landed: Option<u8>,
    pub combo_count: Option<u8>,
    pub last_hit_by: Option<u8>,
    pub stocks: Option<u8>,
    pub state_age: Option<f32>,
    pub flags: Option<StateFlags>,
    pub airborne: Option<bool>,
    pub ground: Option<u16>,
    pub jumps: Option<u8>,
    pub l_cancel: Option<u8>,
}

/// 2D coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

bitflags::bitflags! {
    /// Named boolean state carried by a post-frame record.
    ///
    /// Bit values are model-local; the wire layout lives in the encoder's
    /// flag packer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StateFlags: u16 {
        const REFLECT = 1 << 0;
        const UNTOUCHABLE = 1 << 1;
        const FAST_FALL = 1 << 2;
        const HIT_LAG = 1 << 3;
        const SHIELD = 1 << 4;
        const HIT_STUN = 1 << 5;
        const SHIELD_TOUCH = 1 << 6;
        const POWER_SHIELD = 1 << 7;
        const FOLLOWER = 1 << 8;
        const SLEEP = 1 << 9;
        const DEAD = 1 << 10;
        const OFF_SCREEN = 1 << 11;
    }
}

// Manual serde implementation for StateFlags
impl Serialize for StateFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StateFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(StateFlags::from_bits_truncate(bits))
    }
}
