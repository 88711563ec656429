//! Public Goods Game platform
//!
//! Runs Public Goods Game sessions on top of `settlement-logic`: players join,
//! submit investments round by round (or have an agent, dev-mode generator or
//! scripted strategy submit for them), and each round is settled once every
//! seat has moved. Every state change lands in the session's event log.

/// Return early with `$err` unless `$cond` holds.
#[macro_export]
macro_rules! require {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

pub mod config;
pub mod error;
pub mod instructions;
pub mod logging;
pub mod registry;
pub mod report;
pub mod state;

pub use config::PlatformConfig;
pub use error::PlatformError;
pub use instructions::*;
pub use registry::GameRegistry;
pub use report::{GameStatusReport, PlatformStats, PlayerStatus, RoundStatus};
pub use state::{GameEvent, GameSession, GameStatus, OpenRound, Player, PlayerKind};
