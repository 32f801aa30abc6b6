pub use crate::collectors::Collector;
pub use crate::config::Config;
pub use crate::publishers::Publisher;
pub use crate::services::Services;

pub use human_errors::ResultExt;
pub use serde::{Deserialize, de::DeserializeOwned};
pub use tracing::{debug, error, info, instrument, warn};
