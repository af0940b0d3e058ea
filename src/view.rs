//! Page state for the digest.
//!
//! [`DigestPage`] is the UI tree the templates render from: one top stories
//! region and one list region per configured section. Rendering a document
//! replaces each region wholesale, so repeating a render is a no-op.

use crate::config::SectionConfig;
use crate::model::{FeedDocument, NewsItem, Section};

pub const NO_TOP_STORIES: &str = "No top stories.";
pub const NO_NEWS: &str = "No news.";

/// A top stories card, either the featured one or a secondary one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryCard {
    pub title: String,
    pub url: String,
    pub source: String,
    pub date: String,
}

impl From<&NewsItem> for StoryCard {
    fn from(item: &NewsItem) -> Self {
        Self {
            title: item.title.clone(),
            url: item.url.clone(),
            source: item.source.clone(),
            date: item.date.clone(),
        }
    }
}

/// Top stories region. No featured card means the placeholder is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopStoriesView {
    pub featured: Option<StoryCard>,
    pub secondary: Vec<StoryCard>,
}

impl TopStoriesView {
    pub fn is_empty(&self) -> bool {
        self.featured.is_none()
    }

    pub fn placeholder(&self) -> &'static str {
        NO_TOP_STORIES
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub release_date: Option<String>,
    pub title: String,
    pub url: String,
    pub source: String,
    pub date: String,
}

impl ListRow {
    /// Text shown ahead of the title link, empty for most rows.
    pub fn date_prefix(&self) -> String {
        match &self.release_date {
            Some(date) => format!("{}\u{3000}", date),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub section: Section,
    pub heading: String,
    /// Empty rows render as a single placeholder row.
    pub rows: Vec<ListRow>,
}

impl SectionView {
    pub fn key(&self) -> &'static str {
        self.section.key()
    }

    pub fn placeholder(&self) -> &'static str {
        NO_NEWS
    }
}

pub fn render_top_stories(items: &[NewsItem]) -> TopStoriesView {
    match items.split_first() {
        None => TopStoriesView::default(),
        Some((featured, rest)) => TopStoriesView {
            featured: Some(featured.into()),
            secondary: rest.iter().map(StoryCard::from).collect(),
        },
    }
}

pub fn render_section_rows(section: Section, items: &[NewsItem]) -> Vec<ListRow> {
    items
        .iter()
        .map(|item| ListRow {
            release_date: item
                .release_date
                .clone()
                .filter(|date| section.shows_release_date() && !date.is_empty()),
            title: item.title.clone(),
            url: item.url.clone(),
            source: item.source.clone(),
            date: item.date.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestPage {
    pub generated_at: Option<String>,
    pub top_stories: TopStoriesView,
    pub sections: Vec<SectionView>,
}

impl DigestPage {
    /// An unrendered page: every region shows its placeholder.
    pub fn new(layout: &[SectionConfig]) -> Self {
        Self {
            generated_at: None,
            top_stories: TopStoriesView::default(),
            sections: layout
                .iter()
                .map(|config| SectionView {
                    section: config.key,
                    heading: config.heading().to_string(),
                    rows: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn render(&mut self, document: &FeedDocument) {
        self.generated_at = document.generated_at.clone();
        self.render_top_stories(&document.top_stories);
        self.render_section_lists(document);
    }

    pub fn render_top_stories(&mut self, items: &[NewsItem]) {
        self.top_stories = render_top_stories(items);
    }

    pub fn render_section_lists(&mut self, document: &FeedDocument) {
        for view in &mut self.sections {
            view.rows = render_section_rows(view.section, document.items(view.section));
        }
    }

    pub fn section(&self, section: Section) -> Option<&SectionView> {
        self.sections.iter().find(|view| view.section == section)
    }
}
