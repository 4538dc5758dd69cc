//! Settings for the monitoring dashboard process.
//!
//! The dashboard reads its settings straight from the environment; it has
//! no file layer and does not share state with the agent's resolver.

mod settings;

pub use settings::*;
