#![forbid(unsafe_code)]

pub mod agenda;
pub mod attempt;
pub mod formatted;
pub mod model;
pub mod stats;
pub mod time;

pub use time::Clock;
