//! Process-wide tracing setup. The filter starts at "info" and is swapped
//! once settings are parsed.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
