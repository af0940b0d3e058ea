use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::SectionConfig;
use crate::loader::{FeedLoader, FeedUnavailable};
use crate::view::DigestPage;

/// Loads the feed document and renders it into the shared page.
pub struct FeedRenderer {
    loader: FeedLoader,
    page: RwLock<DigestPage>,
    refreshing: Arc<RwLock<bool>>,
}

impl FeedRenderer {
    pub fn new(loader: FeedLoader, layout: &[SectionConfig]) -> Self {
        Self {
            loader,
            page: RwLock::new(DigestPage::new(layout)),
            refreshing: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn page(&self) -> DigestPage {
        self.page.read().await.clone()
    }

    pub async fn is_refreshing(&self) -> bool {
        *self.refreshing.read().await
    }

    /// Fetch the document and render it. On failure the error is logged and
    /// the page keeps whatever it showed before.
    pub async fn load_and_render(&self) -> Result<(), FeedUnavailable> {
        {
            let mut refreshing = self.refreshing.write().await;
            if *refreshing {
                info!("Load already in progress, skipping");
                return Ok(());
            }
            *refreshing = true;
        }

        let result = self.do_load_and_render().await;

        {
            let mut refreshing = self.refreshing.write().await;
            *refreshing = false;
        }

        if let Err(e) = &result {
            error!("Failed to load news: {}", e);
        }
        result
    }

    async fn do_load_and_render(&self) -> Result<(), FeedUnavailable> {
        info!("Loading news from {}", self.loader.location());
        let document = self.loader.load().await?;

        let mut page = self.page.write().await;
        page.render(&document);
        info!(
            "Rendered {} top stories across {} sections",
            document.top_stories.len(),
            page.sections.len()
        );
        Ok(())
    }
}

/// Time between scheduled loads, `None` when periodic loading is off.
pub fn refresh_period(interval_minutes: u64) -> Option<Duration> {
    (interval_minutes > 0).then(|| Duration::from_secs(interval_minutes.saturating_mul(60)))
}

pub async fn start_background_refresh(renderer: Arc<FeedRenderer>, interval_minutes: u64) {
    info!("Starting initial news load");
    let _ = renderer.load_and_render().await;

    let Some(interval) = refresh_period(interval_minutes) else {
        return;
    };
    loop {
        tokio::time::sleep(interval).await;
        info!("Starting scheduled news load");
        let _ = renderer.load_and_render().await;
    }
}
