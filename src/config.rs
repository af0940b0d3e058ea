use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::model::{Destination, Section};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path or http(s) URL of the feed document
    #[serde(default = "default_feed_location")]
    pub feed_location: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Refresh interval in minutes, 0 loads once at startup
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Section lists shown on the page, in order. Empty means all sections.
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    #[serde(default)]
    pub update: UpdateConfig,
}

fn default_feed_location() -> String {
    "data/news.json".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_refresh_interval() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SectionConfig {
    pub key: Section,
    #[serde(default)]
    pub heading: Option<String>,
}

impl SectionConfig {
    pub fn new(key: Section) -> Self {
        Self { key, heading: None }
    }

    pub fn heading(&self) -> &str {
        self.heading
            .as_deref()
            .unwrap_or_else(|| self.key.default_heading())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpdateConfig {
    #[serde(default = "default_output")]
    pub output: String,
    /// Entries older than this many days are dropped
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_top_stories_limit")]
    pub top_stories_limit: usize,
    /// Upper bound on translation requests per run
    #[serde(default = "default_max_translations")]
    pub max_translations: usize,
    #[serde(default = "default_translate_model")]
    pub translate_model: String,
    #[serde(default = "default_translate_endpoint")]
    pub translate_endpoint: String,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            days: default_days(),
            top_stories_limit: default_top_stories_limit(),
            max_translations: default_max_translations(),
            translate_model: default_translate_model(),
            translate_endpoint: default_translate_endpoint(),
            sources: Vec::new(),
        }
    }
}

fn default_output() -> String {
    "data/news.json".to_string()
}

fn default_days() -> i64 {
    7
}

fn default_top_stories_limit() -> usize {
    3
}

fn default_max_translations() -> usize {
    40
}

fn default_translate_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_translate_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub section: Destination,
    pub url: String,
    pub source: String,
    /// Entries whose title contains any of these are skipped
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.update.days < 0 {
            anyhow::bail!("update.days must not be negative, got {}", self.update.days);
        }
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.key) {
                anyhow::bail!("section '{}' is listed more than once", section.key);
            }
        }
        Ok(())
    }

    /// The page's section regions in display order.
    pub fn layout(&self) -> Vec<SectionConfig> {
        if self.sections.is_empty() {
            Section::ALL.into_iter().map(SectionConfig::new).collect()
        } else {
            self.sections.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::from_str("").unwrap();

        assert_eq!(config.feed_location, "data/news.json");
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.refresh_interval, 15);
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.update.days, 7);
        assert_eq!(config.update.top_stories_limit, 3);
        assert_eq!(config.update.max_translations, 40);
        assert_eq!(config.update.translate_model, "gpt-4o-mini");
        assert!(config.update.sources.is_empty());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
            feed_location = "https://digest.example.com/data/news.json"
            refresh_interval = 0

            [[sections]]
            key = "new_releases"
            heading = "Now Showing"

            [[sections]]
            key = "bd_releases"

            [update]
            output = "out/news.json"
            days = 3

            [[update.sources]]
            section = "top_stories"
            url = "https://variety.com/feed/"
            source = "Variety"

            [[update.sources]]
            section = "new_releases"
            url = "http://feeds.eiga.com/eiga_news"
            source = "Eiga"
            exclude_keywords = ["gossip"]
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.feed_location, "https://digest.example.com/data/news.json");
        assert_eq!(config.refresh_interval, 0);
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.sections[0].heading(), "Now Showing");
        assert_eq!(config.sections[1].heading(), "Blu-ray & DVD");
        assert_eq!(config.update.output, "out/news.json");
        assert_eq!(config.update.days, 3);
        assert_eq!(config.update.top_stories_limit, 3);
        assert_eq!(config.update.sources.len(), 2);
        assert_eq!(config.update.sources[0].section, Destination::TopStories);
        assert_eq!(
            config.update.sources[1].section,
            Destination::Section(Section::NewReleases)
        );
        assert_eq!(config.update.sources[1].exclude_keywords, vec!["gossip"]);
        assert!(config.update.sources[0].exclude_keywords.is_empty());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = Config::load("/nonexistent/path/news.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let result = Config::from_str("this is not valid toml {{{");
        assert!(result.is_err());
    }

    #[test]
    fn test_typoed_section_key_rejected() {
        let content = r#"
            [[sections]]
            key = "bd_release"
        "#;

        assert!(Config::from_str(content).is_err());
    }

    #[test]
    fn test_unknown_source_section_rejected() {
        let content = r#"
            [[update.sources]]
            section = "sports"
            url = "https://example.com/rss"
            source = "Example"
        "#;

        assert!(Config::from_str(content).is_err());
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let content = r#"
            [[sections]]
            key = "tech"

            [[sections]]
            key = "tech"
        "#;

        let err = Config::from_str(content).unwrap_err();
        assert!(err.to_string().contains("tech"));
    }

    #[test]
    fn test_negative_days_rejected() {
        let content = r#"
            [update]
            days = -1
        "#;

        let err = Config::from_str(content).unwrap_err();
        assert!(err.to_string().contains("update.days"));
    }

    #[test]
    fn test_layout_defaults_to_all_sections() {
        let config = Config::from_str("").unwrap();
        let layout = config.layout();

        assert_eq!(layout.len(), Section::ALL.len());
        assert_eq!(layout[0].key, Section::NewReleases);
        assert_eq!(layout[1].heading(), "Blu-ray & DVD");
    }

    #[test]
    fn test_layout_keeps_configured_order() {
        let content = r#"
            [[sections]]
            key = "festivals"

            [[sections]]
            key = "tech"
        "#;

        let config = Config::from_str(content).unwrap();
        let keys: Vec<_> = config.layout().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![Section::Festivals, Section::Tech]);
    }
}
