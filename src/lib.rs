pub mod config;
pub mod simulation;
pub mod backend;

pub use simulation::*;
pub use config::*;
