//! Shared types for the `.slp` replay encoder.
//!
//! - [`slp_format`] - container magic and event codes
//! - [`game`] - the replay model the encoder reads from

pub mod game;
pub mod slp_format;

pub use game::{
    EntityFrame, Frame, Game, GameEnd, GameStart, Player, PortFrame, Position, PostFrame,
    PreFrame, ReplayModel, StateFlags, UcfToggles,
};
pub use slp_format::{EventCode, HEADER_LEN, MAX_PORTS, RAW_LENGTH_WIDTH, SLP_MAGIC};
