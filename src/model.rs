//! Feed document data model.
//!
//! A [`FeedDocument`] is the JSON payload the digest page is built from. It
//! carries an ordered list of top stories plus one list per [`Section`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The closed set of category sections a digest can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    NewReleases,
    BdReleases,
    Retrospectives,
    Industry,
    Tech,
    Festivals,
    International,
    IndustryAffairs,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::NewReleases,
        Section::BdReleases,
        Section::Retrospectives,
        Section::Industry,
        Section::Tech,
        Section::Festivals,
        Section::International,
        Section::IndustryAffairs,
    ];

    /// Key used in the JSON document and in the page's `data-section` tags.
    pub fn key(self) -> &'static str {
        match self {
            Section::NewReleases => "new_releases",
            Section::BdReleases => "bd_releases",
            Section::Retrospectives => "retrospectives",
            Section::Industry => "industry",
            Section::Tech => "tech",
            Section::Festivals => "festivals",
            Section::International => "international",
            Section::IndustryAffairs => "industry_affairs",
        }
    }

    pub fn default_heading(self) -> &'static str {
        match self {
            Section::NewReleases => "New Releases",
            Section::BdReleases => "Blu-ray & DVD",
            Section::Retrospectives => "Retrospectives",
            Section::Industry => "Industry",
            Section::Tech => "Tech",
            Section::Festivals => "Festivals",
            Section::International => "International",
            Section::IndustryAffairs => "Industry Affairs",
        }
    }

    /// Only the home video section prefixes rows with the release date.
    pub fn shows_release_date(self) -> bool {
        matches!(self, Section::BdReleases)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section key: {0}")]
pub struct UnknownSection(pub String);

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.key() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// Where an updater source's entries end up: the top stories list or a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Destination {
    TopStories,
    Section(Section),
}

impl TryFrom<String> for Destination {
    type Error = UnknownSection;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "top_stories" {
            return Ok(Destination::TopStories);
        }
        value.parse().map(Destination::Section)
    }
}

/// One displayable news entry. All fields are opaque display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct FeedDocument {
    pub generated_at: Option<String>,
    pub top_stories: Vec<NewsItem>,
    sections: BTreeMap<Section, Vec<NewsItem>>,
}

impl FeedDocument {
    /// Items of a section, empty when the section is absent.
    pub fn items(&self, section: Section) -> &[NewsItem] {
        self.sections
            .get(&section)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the document carried the section key at all (possibly empty).
    pub fn contains(&self, section: Section) -> bool {
        self.sections.contains_key(&section)
    }

    pub fn push(&mut self, destination: Destination, item: NewsItem) {
        match destination {
            Destination::TopStories => self.top_stories.push(item),
            Destination::Section(section) => self.sections.entry(section).or_default().push(item),
        }
    }

    /// Every item in the document, top stories first, then sections in order.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut NewsItem> {
        self.top_stories
            .iter_mut()
            .chain(self.sections.values_mut().flat_map(|items| items.iter_mut()))
    }
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    generated_at: Option<String>,
    #[serde(default)]
    top_stories: Option<Vec<NewsItem>>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawDocument> for FeedDocument {
    type Error = serde_json::Error;

    fn try_from(mut raw: RawDocument) -> Result<Self, Self::Error> {
        let mut sections = BTreeMap::new();
        for section in Section::ALL {
            match raw.rest.remove(section.key()) {
                None | Some(serde_json::Value::Null) => {}
                Some(value) => {
                    let items: Vec<NewsItem> = serde_json::from_value(value)?;
                    sections.insert(section, items);
                }
            }
        }

        Ok(FeedDocument {
            generated_at: raw.generated_at,
            top_stories: raw.top_stories.unwrap_or_default(),
            sections,
        })
    }
}

impl Serialize for FeedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(generated_at) = &self.generated_at {
            map.serialize_entry("generated_at", generated_at)?;
        }
        map.serialize_entry("top_stories", &self.top_stories)?;
        for section in Section::ALL {
            map.serialize_entry(section.key(), self.items(section))?;
        }
        map.end()
    }
}
