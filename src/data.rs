use std::collections::{HashMap, HashSet};
use std::thread;

use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::hackernews::{self, Category, FetchError, Item, ItemKind, Updates};

/// Read side of the content API. Implementors only provide single-resource
/// lookups; the batch helpers fan out concurrently and keep request order.
pub trait ItemSource: Send + Sync {
    fn item(&self, id: i64) -> Result<Item, FetchError>;
    fn story_ids(&self, category: Category) -> Result<Vec<i64>, FetchError>;
    fn updates(&self) -> Result<Updates, FetchError>;

    /// Resolves every id in parallel. Any single failure fails the batch.
    fn items(&self, ids: &[i64]) -> Result<Vec<Item>, FetchError> {
        thread::scope(|scope| {
            let handles: Vec<_> = ids
                .iter()
                .map(|&id| scope.spawn(move || self.item(id)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(Err(FetchError::Worker)))
                .collect()
        })
    }

    /// `len` items of `category` starting at `start`, clamped to the list.
    fn page(&self, category: Category, start: usize, len: usize) -> Result<Vec<Item>, FetchError> {
        let ids = self.story_ids(category)?;
        let start = start.min(ids.len());
        let end = start.saturating_add(len).min(ids.len());
        self.items(&ids[start..end])
    }
}

impl ItemSource for hackernews::Client {
    fn item(&self, id: i64) -> Result<Item, FetchError> {
        hackernews::Client::item(self, id)
    }

    fn story_ids(&self, category: Category) -> Result<Vec<i64>, FetchError> {
        hackernews::Client::story_ids(self, category)
    }

    fn updates(&self) -> Result<Updates, FetchError> {
        hackernews::Client::updates(self)
    }
}

/// In-memory source. Backs the `--demo` mode and the test suites.
#[derive(Default)]
pub struct StaticItemSource {
    items: HashMap<i64, Item>,
    lists: HashMap<Category, Vec<i64>>,
    updates: Mutex<Updates>,
    failing: HashSet<i64>,
    requests: Mutex<Vec<i64>>,
}

impl StaticItemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id, item);
        self
    }

    pub fn with_list(mut self, category: Category, ids: Vec<i64>) -> Self {
        self.lists.insert(category, ids);
        self
    }

    pub fn with_updates(self, updates: Updates) -> Self {
        *self.updates.lock() = updates;
        self
    }

    /// Lookups of `id` answer with a server error.
    pub fn with_failure(mut self, id: i64) -> Self {
        self.failing.insert(id);
        self
    }

    pub fn set_updates(&self, updates: Updates) {
        *self.updates.lock() = updates;
    }

    /// Number of item lookups issued for `id` so far.
    pub fn request_count(&self, id: i64) -> usize {
        self.requests.lock().iter().filter(|&&seen| seen == id).count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().len()
    }
}

impl ItemSource for StaticItemSource {
    fn item(&self, id: i64) -> Result<Item, FetchError> {
        self.requests.lock().push(id);
        if self.failing.contains(&id) {
            return Err(FetchError::Status {
                url: format!("static://item/{id}"),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        self.items
            .get(&id)
            .cloned()
            .ok_or(FetchError::Missing { id })
    }

    fn story_ids(&self, category: Category) -> Result<Vec<i64>, FetchError> {
        Ok(self.lists.get(&category).cloned().unwrap_or_default())
    }

    fn updates(&self) -> Result<Updates, FetchError> {
        Ok(self.updates.lock().clone())
    }
}

/// Small offline data set exercising every item kind.
pub fn demo_source() -> StaticItemSource {
    let now = chrono::Utc::now().timestamp();
    let story = |id: i64, title: &str, kids: Vec<i64>, descendants: i64| Item {
        id,
        kind: ItemKind::Story,
        by: Some("clonernews".into()),
        time: Some(now - id * 60),
        score: Some(100 + id),
        title: Some(title.into()),
        url: Some(format!("https://example.com/{id}")),
        kids: if kids.is_empty() { None } else { Some(kids) },
        descendants: Some(descendants),
        ..Item::default()
    };
    let comment = |id: i64, parent: i64, by: &str, text: &str, kids: Vec<i64>| Item {
        id,
        kind: ItemKind::Comment,
        by: Some(by.into()),
        time: Some(now - 30),
        text: Some(text.into()),
        parent: Some(parent),
        kids: if kids.is_empty() { None } else { Some(kids) },
        ..Item::default()
    };

    StaticItemSource::new()
        .with_item(story(1, "Welcome to clonernews", vec![101, 102, 103], 4))
        .with_item(story(2, "Press 1-6 to switch categories", vec![], 0))
        .with_item(story(3, "Press Enter to expand comments", vec![104], 1))
        .with_item(comment(
            101,
            1,
            "alice",
            "Comments load one level at a time.<p>Replies expand on demand.",
            vec![105],
        ))
        .with_item(comment(102, 1, "bob", "No re-fetch when you collapse &amp; expand.", vec![]))
        .with_item(Item {
            id: 103,
            kind: ItemKind::Comment,
            parent: Some(1),
            deleted: true,
            ..Item::default()
        })
        .with_item(comment(104, 3, "carol", "Selection near the end loads more.", vec![]))
        .with_item(comment(105, 101, "dave", "Like this one.", vec![]))
        .with_item(Item {
            id: 4,
            kind: ItemKind::Job,
            by: Some("acme".into()),
            time: Some(now - 3600),
            title: Some("Acme is hiring Rust engineers".into()),
            ..Item::default()
        })
        .with_item(Item {
            id: 5,
            kind: ItemKind::Poll,
            by: Some("pollster".into()),
            time: Some(now - 7200),
            score: Some(42),
            title: Some("Which editor do you use?".into()),
            parts: Some(vec![51, 52]),
            descendants: Some(0),
            ..Item::default()
        })
        .with_item(Item {
            id: 51,
            kind: ItemKind::PollOpt,
            poll: Some(5),
            text: Some("Vim".into()),
            score: Some(30),
            ..Item::default()
        })
        .with_item(Item {
            id: 52,
            kind: ItemKind::PollOpt,
            poll: Some(5),
            text: Some("Emacs".into()),
            score: Some(12),
            ..Item::default()
        })
        .with_item(story(6, "Show HN: A terminal Hacker News feed", vec![], 0))
        .with_item(story(7, "Ask HN: What are you building?", vec![], 0))
        .with_list(Category::Top, vec![1, 2, 3, 6, 7])
        .with_list(Category::New, vec![7, 6, 3, 2, 1])
        .with_list(Category::Best, vec![1, 3])
        .with_list(Category::Jobs, vec![4])
        .with_list(Category::Ask, vec![7])
        .with_list(Category::Show, vec![6])
        .with_list(Category::Polls, vec![5])
        .with_updates(Updates {
            items: vec![4, 5],
            profiles: vec!["alice".into()],
        })
}
