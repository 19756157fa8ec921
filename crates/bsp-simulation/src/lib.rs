//! BSP-Simulation: synthetic biosignal acquisition
//!
//! Provides a simulated recording device producing gapped multi-channel
//! recordings for testing and development.

pub mod signal_patterns;
pub mod simulator;

pub use signal_patterns::*;
pub use simulator::*;
