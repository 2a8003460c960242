use serde::{Deserialize, Serialize};

/// Tunables for the engine's deferred work and proxy routing.
///
/// Defaults match the production service; hosts and tests override as
/// needed. All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Origin substituted for the `{{PROXY_BASE}}` placeholder in delivered
    /// markup and prepended to repaired asset URLs.
    pub proxy_base: String,
    /// Staggered asset-repair passes after content injection: immediate,
    /// around DOM-ready, and after subresources typically land.
    pub repair_delays_ms: Vec<u64>,
    /// Debounce for structural-change-triggered repair.
    pub mutation_debounce_ms: u64,
    /// Deferral before the extraction pass, so referenced stylesheets
    /// finish loading.
    pub extract_delay_ms: u64,
    /// Scroll-sync attach retry backoff for a single before/after pair.
    pub attach_delays_pair_ms: Vec<u64>,
    /// Attach retry backoff when several pairs are live (multi-device
    /// comparison is heavier, so the surfaces get more time).
    pub attach_delays_multi_ms: Vec<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proxy_base: String::new(),
            repair_delays_ms: vec![0, 400, 1500],
            mutation_debounce_ms: 150,
            extract_delay_ms: 800,
            attach_delays_pair_ms: vec![100, 250, 600],
            attach_delays_multi_ms: vec![250, 600, 1200, 2400],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"proxy_base": "https://proxy.test"}"#).expect("parse");
        assert_eq!(config.proxy_base, "https://proxy.test");
        assert_eq!(config.repair_delays_ms, vec![0, 400, 1500]);
    }

    #[test]
    fn pair_backoff_is_shorter_than_multi() {
        let config = EngineConfig::default();
        assert!(
            config.attach_delays_pair_ms.iter().sum::<u64>()
                < config.attach_delays_multi_ms.iter().sum::<u64>()
        );
    }
}
