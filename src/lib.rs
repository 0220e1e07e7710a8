extern crate petgraph;
extern crate bincode;

pub mod errors;
pub mod config;
pub mod graphs;
pub mod aligner;
pub mod window;
pub mod batch;
pub mod io;

pub use config::{WindowConfig, WindowLimits};
pub use errors::{Capacity, PoaError};
pub use window::Window;
