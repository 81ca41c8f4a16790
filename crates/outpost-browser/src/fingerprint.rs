use outpost_core::BrowserConfig;
use rand::Rng;

/// Desktop user agents the randomized fingerprint picks from.
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Timezone of the target site's audience.
const DEFAULT_TIMEZONE: &str = "Asia/Kuala_Lumpur";

/// Browser identity presented to the locator page
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub timezone: String,
}

impl FingerprintConfig {
    /// Generate a randomized fingerprint configuration
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        // Common viewport sizes
        let viewports = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

        let ua_idx = rng.gen_range(0..USER_AGENTS.len());
        let vp_idx = rng.gen_range(0..viewports.len());
        let (width, height) = viewports[vp_idx];

        Self {
            user_agent: USER_AGENTS[ua_idx].to_string(),
            viewport_width: width,
            viewport_height: height,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    /// Fingerprint matching the configured window, or a randomized one
    pub fn from_config(config: &BrowserConfig) -> Self {
        if config.randomize_fingerprint {
            return Self::randomized();
        }

        Self {
            user_agent: USER_AGENTS[0].to_string(),
            viewport_width: config.window_width,
            viewport_height: config.window_height,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomized_fingerprint() {
        let config = FingerprintConfig::randomized();
        assert!(!config.user_agent.is_empty());
        assert!(config.viewport_width > 0);
        assert!(config.viewport_height > 0);
        assert_eq!(config.timezone, "Asia/Kuala_Lumpur");
    }

    #[test]
    fn test_fingerprint_variation() {
        // Probabilistic, but 20 identical draws out of 3x4 combinations is vanishingly unlikely
        let configs: Vec<_> = (0..20).map(|_| FingerprintConfig::randomized()).collect();

        let first = (&configs[0].user_agent, configs[0].viewport_width);
        let all_same = configs
            .iter()
            .all(|c| (&c.user_agent, c.viewport_width) == first);
        assert!(!all_same, "Expected variation in fingerprints");
    }

    #[test]
    fn test_from_config_uses_window_size() {
        let browser = BrowserConfig {
            window_width: 1280,
            window_height: 720,
            ..BrowserConfig::default()
        };
        let fingerprint = FingerprintConfig::from_config(&browser);
        assert_eq!(fingerprint.viewport_width, 1280);
        assert_eq!(fingerprint.viewport_height, 720);
    }
}
