//! Query configuration for connection search and departure boards.

/// Parameters applied to incoming queries before they reach the index.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Window used when a request gives none or an invalid one (minutes).
    pub default_window_mins: u32,

    /// Largest window a request may ask for (minutes).
    /// Larger requests are clamped to this.
    pub max_window_mins: u32,
}

impl QueryConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(default_window_mins: u32, max_window_mins: u32) -> Self {
        Self {
            default_window_mins,
            max_window_mins,
        }
    }

    /// Resolve a requested window: missing or zero falls back to the
    /// default, anything above the maximum is clamped.
    pub fn window_mins(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(w) if w > 0 => w.min(self.max_window_mins),
            _ => self.default_window_mins,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_window_mins: 60,
            max_window_mins: 24 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = QueryConfig::default();

        assert_eq!(config.default_window_mins, 60);
        assert_eq!(config.max_window_mins, 1440);
    }

    #[test]
    fn window_resolution() {
        let config = QueryConfig::new(30, 120);

        assert_eq!(config.window_mins(None), 30);
        assert_eq!(config.window_mins(Some(0)), 30);
        assert_eq!(config.window_mins(Some(45)), 45);
        assert_eq!(config.window_mins(Some(500)), 120);
    }
}
