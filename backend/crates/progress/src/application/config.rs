//! Application Configuration
//!
//! Configuration for the progress application layer.

/// Progress application configuration
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Fallback scoring ceiling for catalog records without one
    pub default_max_score: i64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            default_max_score: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert_eq!(config.default_max_score, 100);
    }
}
