//! Application Services
//!
//! Services that turn decoded exchange events into state changes.
//!
//! - `normalize`: ticker event to partial quote, shared by every asset

mod normalize;

pub use normalize::{TickerChannel, TickerFields, classify, normalize};
