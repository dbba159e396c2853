#![doc = include_str!("../README.md")]

mod config;
mod counter;
mod error;
mod item;
mod latency;
mod mutex;
mod pool;
mod process;
mod runner;

pub use crate::config::*;
pub use crate::counter::*;
pub use crate::error::*;
pub use crate::item::*;
pub use crate::latency::*;
pub use crate::mutex::*;
pub use crate::pool::*;
pub use crate::process::*;
pub use crate::runner::*;
