// gravcomp-core: parameter store, loop config, control time and errors shared
// by the gravity compensation workspace.

pub mod config;
pub mod error;
pub mod time;

pub mod prelude {
    pub use crate::config::{LoopConfig, ParamSource, ParamStore, ParamValue, ScopedParams};
    pub use crate::error::ConfigError;
    pub use crate::time::{ControlTime, LoopClock};
}
