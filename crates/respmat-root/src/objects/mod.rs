//! ROOT object deserialization.

mod ttree;

pub use ttree::read_ttree;
