//! Post-frame state flag packing
//!
//! The post-frame record carries five consecutive flag bytes
//! (`statebitflags1..5`). Each named flag owns exactly one bit.
//!
//! ```text
//! byte 1: bit 4 reflect
//! byte 2: bit 2 untouchable, bit 3 fast-fall, bit 5 hit-lag
//! byte 3: bit 7 shield
//! byte 4: bit 1 hit-stun, bit 2 shield-touch, bit 5 power-shield
//! byte 5: bit 3 follower, bit 4 sleep, bit 6 dead, bit 7 off-screen
//! ```
//!
//! The layout belongs to the container revision that introduced the flag
//! bytes (2.0.0). The flag leaves are version gated by the schema, but the
//! bit positions themselves are not.

use slp_shared::StateFlags;

/// Number of flag bytes on the wire
pub const STATE_FLAG_BYTES: usize = 5;

/// Schema leaf names receiving the packed bytes, in byte order
pub const STATE_FLAG_FIELDS: [&str; STATE_FLAG_BYTES] = [
    "statebitflags1",
    "statebitflags2",
    "statebitflags3",
    "statebitflags4",
    "statebitflags5",
];

/// Bit position of one flag: zero-based byte index and bit (0 = LSB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagBit {
    pub flag: StateFlags,
    pub byte: usize,
    pub bit: u8,
}

const fn at(flag: StateFlags, byte: usize, bit: u8) -> FlagBit {
    FlagBit { flag, byte, bit }
}

/// Wire position of every state flag
pub const STATE_FLAG_LAYOUT: [FlagBit; 12] = [
    at(StateFlags::REFLECT, 0, 4),
    at(StateFlags::UNTOUCHABLE, 1, 2),
    at(StateFlags::FAST_FALL, 1, 3),
    at(StateFlags::HIT_LAG, 1, 5),
    at(StateFlags::SHIELD, 2, 7),
    at(StateFlags::HIT_STUN, 3, 1),
    at(StateFlags::SHIELD_TOUCH, 3, 2),
    at(StateFlags::POWER_SHIELD, 3, 5),
    at(StateFlags::FOLLOWER, 4, 3),
    at(StateFlags::SLEEP, 4, 4),
    at(StateFlags::DEAD, 4, 6),
    at(StateFlags::OFF_SCREEN, 4, 7),
];

/// Pack named flags into the five wire bytes
pub fn pack_state_flags(flags: StateFlags) -> [u8; STATE_FLAG_BYTES] {
    let mut bytes = [0u8; STATE_FLAG_BYTES];
    for entry in &STATE_FLAG_LAYOUT {
        if flags.contains(entry.flag) {
            bytes[entry.byte] |= 1 << entry.bit;
        }
    }
    bytes
}
