use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
pub const HN_SEARCH_BASE: &str = "https://hn.algolia.com/api/v1";
pub const HN_ITEM_URL: &str = "https://news.ycombinator.com/item";

const DEFAULT_SEARCH_HITS: usize = 100;

/// Everything the fetch layer can fail with. Callers decide whether to
/// propagate or log and continue.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("item {id} does not exist")]
    Missing { id: i64 },
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("fetch worker panicked")]
    Worker,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: String,
    pub search_url: String,
    pub timeout: Duration,
    pub http_client: Option<HttpClient>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("clonernews/{}", crate::VERSION),
            base_url: HN_API_BASE.to_string(),
            search_url: HN_SEARCH_BASE.to_string(),
            timeout: Duration::from_secs(20),
            http_client: None,
        }
    }
}

/// Content partitions. `Best` only backs a sidebar list and is not offered
/// as a feed tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    #[default]
    New,
    Best,
    Jobs,
    Ask,
    Show,
    Polls,
}

impl Category {
    pub const FEED: [Category; 6] = [
        Category::Top,
        Category::New,
        Category::Jobs,
        Category::Ask,
        Category::Show,
        Category::Polls,
    ];

    /// List endpoint name, `None` for categories served by search.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            Category::Top => Some("topstories"),
            Category::New => Some("newstories"),
            Category::Best => Some("beststories"),
            Category::Jobs => Some("jobstories"),
            Category::Ask => Some("askstories"),
            Category::Show => Some("showstories"),
            Category::Polls => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Top => "Top",
            Category::New => "New",
            Category::Best => "Best",
            Category::Jobs => "Jobs",
            Category::Ask => "Ask HN",
            Category::Show => "Show HN",
            Category::Polls => "Polls",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "top" | "topstories" => Some(Category::Top),
            "new" | "newstories" => Some(Category::New),
            "best" | "beststories" => Some(Category::Best),
            "jobs" | "job" | "jobstories" => Some(Category::Jobs),
            "ask" | "askstories" => Some(Category::Ask),
            "show" | "showstories" => Some(Category::Show),
            "polls" | "poll" | "pollstories" => Some(Category::Polls),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Story,
    Job,
    Poll,
    PollOpt,
    Comment,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::Story => "story",
            ItemKind::Job => "job",
            ItemKind::Poll => "poll",
            ItemKind::PollOpt => "pollopt",
            ItemKind::Comment => "comment",
            ItemKind::Unknown => "item",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Item {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub kids: Option<Vec<i64>>,
    #[serde(default)]
    pub parts: Option<Vec<i64>>,
    #[serde(default)]
    pub poll: Option<i64>,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub descendants: Option<i64>,
}

impl Item {
    pub fn kids(&self) -> &[i64] {
        self.kids.as_deref().unwrap_or_default()
    }

    pub fn parts(&self) -> &[i64] {
        self.parts.as_deref().unwrap_or_default()
    }

    pub fn has_kids(&self) -> bool {
        !self.kids().is_empty()
    }

    /// Deleted and flagged items stay in fetched sets but render as nothing.
    pub fn is_hidden(&self) -> bool {
        self.deleted || self.dead
    }

    /// External url, or the item's own discussion page.
    pub fn link(&self) -> String {
        match self.url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => permalink(self.id),
        }
    }
}

pub fn permalink(id: i64) -> String {
    format!("{}?id={}", HN_ITEM_URL, id)
}

/// Snapshot of recently changed items and profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Updates {
    #[serde(default)]
    pub items: Vec<i64>,
    #[serde(default)]
    pub profiles: Vec<String>,
}

impl Updates {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.profiles.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "objectID")]
    object_id: String,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: String,
    search_url: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        if config.user_agent.trim().is_empty() {
            anyhow::bail!("hackernews client user agent required");
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder().timeout(config.timeout).build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_url: config.search_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn item(&self, id: i64) -> Result<Item, FetchError> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        let item: Option<Item> = self.get_json(&url)?;
        item.ok_or(FetchError::Missing { id })
    }

    pub fn story_ids(&self, category: Category) -> Result<Vec<i64>, FetchError> {
        match category.endpoint() {
            Some(endpoint) => {
                let url = format!("{}/{}.json", self.base_url, endpoint);
                let ids: Option<Vec<i64>> = self.get_json(&url)?;
                Ok(ids.unwrap_or_default())
            }
            None => self.search_ids("poll"),
        }
    }

    pub fn updates(&self) -> Result<Updates, FetchError> {
        let url = format!("{}/updates.json", self.base_url);
        let updates: Option<Updates> = self.get_json(&url)?;
        Ok(updates.unwrap_or_default())
    }

    fn search_ids(&self, tag: &str) -> Result<Vec<i64>, FetchError> {
        let mut url = Url::parse(&format!("{}/search_by_date", self.search_url))?;
        url.query_pairs_mut()
            .append_pair("tags", tag)
            .append_pair("hitsPerPage", &DEFAULT_SEARCH_HITS.to_string());
        let response: SearchResponse = self.get_json(url.as_str())?;
        Ok(response
            .hits
            .iter()
            .filter_map(|hit| hit.object_id.parse::<i64>().ok())
            .collect())
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_decodes_api_shape() {
        let raw = r#"{
            "by": "dhouston", "descendants": 71, "id": 8863,
            "kids": [8952, 9224], "score": 111, "time": 1175714200,
            "title": "My YC app: Dropbox", "type": "story",
            "url": "http://www.getdropbox.com/u/2/screencast.html"
        }"#;
        let item: Item = serde_json::from_str(raw).unwrap();
        assert_eq!(item.id, 8863);
        assert_eq!(item.kind, ItemKind::Story);
        assert_eq!(item.kids(), &[8952, 9224]);
        assert_eq!(item.descendants, Some(71));
        assert!(!item.is_hidden());
    }

    #[test]
    fn unknown_kind_and_missing_fields_default() {
        let item: Item = serde_json::from_str(r#"{"id": 5, "type": "banner"}"#).unwrap();
        assert_eq!(item.kind, ItemKind::Unknown);
        assert!(item.kids().is_empty());
        assert!(item.parts().is_empty());
        assert_eq!(item.link(), "https://news.ycombinator.com/item?id=5");
    }

    #[test]
    fn pollopt_kind_decodes() {
        let item: Item =
            serde_json::from_str(r#"{"id": 7, "type": "pollopt", "poll": 6, "score": 3}"#)
                .unwrap();
        assert_eq!(item.kind, ItemKind::PollOpt);
        assert_eq!(item.poll, Some(6));
        assert_eq!(item.kind.to_string(), "pollopt");
    }

    #[test]
    fn deleted_comment_is_hidden() {
        let item: Item =
            serde_json::from_str(r#"{"id": 9, "type": "comment", "deleted": true}"#).unwrap();
        assert!(item.is_hidden());
    }

    #[test]
    fn category_keys_round_trip_through_endpoints() {
        for category in Category::FEED {
            if let Some(endpoint) = category.endpoint() {
                assert_eq!(Category::from_key(endpoint), Some(category));
            }
        }
        assert_eq!(Category::from_key("polls"), Some(Category::Polls));
        assert_eq!(Category::Polls.endpoint(), None);
        assert_eq!(Category::from_key("frontpage"), None);
    }

    #[test]
    fn updates_emptiness_counts_profiles() {
        let updates = Updates {
            items: vec![],
            profiles: vec!["pg".into()],
        };
        assert!(!updates.is_empty());
        assert!(Updates::default().is_empty());
    }

    #[test]
    fn client_requires_user_agent() {
        let config = ClientConfig {
            user_agent: "  ".into(),
            ..ClientConfig::default()
        };
        assert!(Client::new(config).is_err());
    }
}
