//! Type definitions

pub mod daily_log;
pub mod duty;
pub mod location;
pub mod plan_result;
pub mod stop;
pub mod trip;

pub use daily_log::*;
pub use duty::*;
pub use location::*;
pub use plan_result::*;
pub use stop::*;
pub use trip::*;
