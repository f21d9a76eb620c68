pub use anyhow::{Error, Result, anyhow, bail};
pub use async_trait::async_trait;
pub use bytes::{self, Bytes};
pub use chrono;
pub use rand;
pub use serde_json::{self as json, Value};

pub mod utils;

/// Collision-resistant identifier used for every persisted record.
pub fn create_id() -> String {
    cuid2::create_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_url_safe() {
        let a = create_id();
        let b = create_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
