pub use std::time::Duration as StdDuration;
pub use std::time::Instant;

pub use anyhow::{anyhow, bail, Context};
pub use itertools::Itertools;
pub use tracing::{debug, error, info, instrument, warn};

pub type AHashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
