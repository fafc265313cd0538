//! Additional tests for the static tables and their validation

use super::{validate_config, ServerConfig, SizeProfile, WebsiteTarget};
use crate::defaults;

/// Checks over the built-in tables
mod default_tables {
    use super::*;

    #[test]
    fn test_every_size_is_positive_and_ordered() {
        let config = ServerConfig::default();
        let sizes: Vec<u64> = config.file_sizes.iter().map(|p| p.size_bytes).collect();

        assert!(sizes.iter().all(|&s| s > 0));
        assert!(sizes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(sizes, vec![1, 10, 50, 100].into_iter().map(|m| m * defaults::MEBIBYTE).collect::<Vec<_>>());
    }

    #[test]
    fn test_size_mb_matches_bytes() {
        for profile in &ServerConfig::default().file_sizes {
            let expected = (profile.size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
            assert_eq!(profile.size_mb(), expected, "size_mb mismatch for {}", profile.key);
        }
    }

    #[test]
    fn test_websites_are_unique_and_https() {
        let config = ServerConfig::default();
        let mut keys: Vec<&str> = config.websites.iter().map(|w| w.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), config.websites.len());

        for site in &config.websites {
            assert!(site.url.starts_with("https://"), "{} is not https", site.key);
            assert!(!site.name.is_empty());
            assert!(!site.description.is_empty());
        }
    }
}

/// Edge cases for custom configurations built in tests
mod custom_configs {
    use super::*;

    #[test]
    fn test_single_size_table() {
        let mut config = ServerConfig::default();
        config.file_sizes = vec![SizeProfile::new("tiny", 10)];
        config.default_size_key = "tiny".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_localhost_targets_are_accepted() {
        let mut config = ServerConfig::default();
        config.websites = vec![
            WebsiteTarget::new("local", "Local", "http://127.0.0.1:9", "Loopback"),
            WebsiteTarget::new("local-tls", "Local TLS", "https://localhost:8443", "Loopback TLS"),
        ];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_website_key() {
        let mut config = ServerConfig::default();
        config.websites.push(WebsiteTarget::new("  ", "Blank", "https://example.com", ""));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_website_key() {
        let mut config = ServerConfig::default();
        let duplicate = config.websites[0].clone();
        config.websites.push(duplicate);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_header_unsafe_size_key_is_rejected() {
        for key in ["bad key;", "50m\r\nX-Injected: 1", "größe", "a/b"] {
            let mut config = ServerConfig::default();
            config.file_sizes.push(SizeProfile::new(key, 1024));

            let err = validate_config(&config).unwrap_err();
            assert_eq!(err.category(), "CONFIG", "{:?} should be rejected", key);
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn test_header_safe_size_keys_are_accepted() {
        let mut config = ServerConfig::default();
        config.file_sizes.push(SizeProfile::new("250m_extra-large", 1024));
        assert!(validate_config(&config).is_ok());
    }
}
