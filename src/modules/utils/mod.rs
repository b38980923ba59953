pub mod io;
pub mod logging;
pub mod time;

pub use logging::{format_sensitive, initialize_logging, log_auth_event};
pub use time::{Clock, FixedClock, SystemClock};
