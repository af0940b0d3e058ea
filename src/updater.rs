//! Builds the feed document from RSS/Atom sources.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::{SourceConfig, UpdateConfig};
use crate::model::{FeedDocument, NewsItem};
use crate::translate::Translator;

pub struct Updater {
    client: Client,
    config: UpdateConfig,
}

impl Updater {
    pub fn new(config: UpdateConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("NewsDigest/1.0 (Digest Updater)")
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch every source, then order, trim and translate the result.
    pub async fn build_document(
        &self,
        translator: &mut Translator,
    ) -> anyhow::Result<FeedDocument> {
        let now = Utc::now();
        let since = window_start(now, self.config.days)?;

        let mut document = FeedDocument::default();
        for source in &self.config.sources {
            match self.fetch_source(source, since).await {
                Ok(items) => {
                    info!("Collected {} items from '{}'", items.len(), source.source);
                    for item in items {
                        document.push(source.section, item);
                    }
                }
                Err(e) => error!("Failed to fetch source '{}' ({}): {}", source.source, source.url, e),
            }
        }

        select_top_stories(&mut document.top_stories, self.config.top_stories_limit);

        if translator.is_enabled() {
            for item in document.items_mut() {
                item.title = translator.translate(&item.title).await;
            }
        }

        document.generated_at = Some(now.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
        Ok(document)
    }

    async fn fetch_source(
        &self,
        source: &SourceConfig,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<NewsItem>> {
        info!("Fetching source: {} ({})", source.source, source.url);

        let response = self.client.get(&source.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        let parsed = parser::parse(&bytes[..])?;

        Ok(collect_entries(source, parsed, since))
    }

    pub async fn run(&self, translator: &mut Translator) -> anyhow::Result<FeedDocument> {
        let document = self.build_document(translator).await?;
        write_document(&self.config.output, &document)?;
        info!("Wrote digest to {}", self.config.output);
        Ok(document)
    }
}

/// Oldest publication time still kept, `days` before `now`.
pub fn window_start(now: DateTime<Utc>, days: i64) -> anyhow::Result<DateTime<Utc>> {
    chrono::Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| anyhow::anyhow!("update window of {} days is out of range", days))
}

/// Turn parsed feed entries into news items, dropping undated, stale,
/// linkless and excluded entries.
pub fn collect_entries(
    source: &SourceConfig,
    feed: feed_rs::model::Feed,
    since: DateTime<Utc>,
) -> Vec<NewsItem> {
    let mut items = Vec::new();

    for entry in feed.entries {
        let Some(published) = entry.published.or(entry.updated) else {
            continue;
        };
        if published < since {
            continue;
        }

        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .unwrap_or_else(|| "Untitled".to_string());

        if source
            .exclude_keywords
            .iter()
            .any(|keyword| title.contains(keyword.as_str()))
        {
            continue;
        }

        let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
            warn!("Skipping entry with no link: {}", title);
            continue;
        };

        items.push(NewsItem {
            title,
            source: source.source.clone(),
            date: published.format("%Y-%m-%d").to_string(),
            url: link,
            release_date: None,
        });
    }

    items
}

/// Newest first, keeping feed order among equal dates.
pub fn select_top_stories(items: &mut Vec<NewsItem>, limit: usize) {
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(limit);
}

pub fn write_document<P: AsRef<Path>>(path: P, document: &FeedDocument) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json)?;
    Ok(())
}
