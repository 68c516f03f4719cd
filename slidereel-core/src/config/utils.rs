//! Configuration utility functions
//!
//! Helpers for reading configuration overrides from environment variables.
//! Unparseable values fall back to the default.

/// Get a string value from an environment variable or use the default
pub fn get_env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Get a boolean value from an environment variable or use the default
pub fn get_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => val.to_lowercase() == "true" || val == "1",
        Err(_) => default,
    }
}

/// Get a u64 value from an environment variable or use the default
pub fn get_env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Get a usize value from an environment variable, if set and parseable
pub fn get_env_opt_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|val| val.trim().parse().ok())
}
