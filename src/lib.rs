#![warn(
    unused_extern_crates,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::fallible_impl_from,
    clippy::dbg_macro
)]
#![forbid(unsafe_code)]

pub mod actor;
pub mod bitcoin;
pub mod bitcoind;
pub mod config;
pub mod ethereum;
pub mod jsonrpc;
pub mod poll;
pub mod step;
pub mod swap;
pub mod swapd;


pub use actor::Actor;
pub use step::{Executor, Step};
pub use swap::{ActionKind, SwapId, SwapRequest, SwapState};
