use std::thread;

use tracing::warn;

use crate::data::ItemSource;
use crate::hackernews::Category;

pub const DEFAULT_SIDEBAR_SIZE: usize = 10;
pub const SIDEBAR_CATEGORIES: [Category; 3] = [Category::Top, Category::New, Category::Best];

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarEntry {
    pub id: i64,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarList {
    pub category: Category,
    pub entries: Vec<SidebarEntry>,
}

/// First `size` stories of `category`. A failed fetch is logged and yields
/// an empty list; the sidebar is decoration and never blocks the feed.
pub fn load_list(source: &dyn ItemSource, category: Category, size: usize) -> SidebarList {
    let entries = match source.page(category, 0, size) {
        Ok(items) => items
            .into_iter()
            .map(|item| SidebarEntry {
                id: item.id,
                title: item.title.clone().unwrap_or_default(),
                link: item.link(),
            })
            .collect(),
        Err(err) => {
            warn!(category = ?category, error = %err, "error fetching sidebar posts");
            Vec::new()
        }
    };
    SidebarList { category, entries }
}

/// Loads every sidebar list at once, in `SIDEBAR_CATEGORIES` order.
pub fn load_all(source: &dyn ItemSource, size: usize) -> Vec<SidebarList> {
    thread::scope(|scope| {
        let handles: Vec<_> = SIDEBAR_CATEGORIES
            .iter()
            .map(|&category| (category, scope.spawn(move || load_list(source, category, size))))
            .collect();
        handles
            .into_iter()
            .map(|(category, handle)| {
                handle.join().unwrap_or_else(|_| {
                    warn!(category = ?category, "sidebar worker panicked");
                    SidebarList {
                        category,
                        entries: Vec::new(),
                    }
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticItemSource;
    use crate::hackernews::{Item, ItemKind};

    fn source() -> StaticItemSource {
        let mut source = StaticItemSource::new();
        for id in 1..=12 {
            source = source.with_item(Item {
                id,
                kind: ItemKind::Story,
                title: Some(format!("story {id}")),
                url: if id == 1 { Some("https://a.example".into()) } else { None },
                ..Item::default()
            });
        }
        source
            .with_list(Category::Top, (1..=12).collect())
            .with_list(Category::New, vec![12, 11])
    }

    #[test]
    fn lists_are_capped_and_linked() {
        let list = load_list(&source(), Category::Top, DEFAULT_SIDEBAR_SIZE);
        assert_eq!(list.entries.len(), 10);
        assert_eq!(list.entries[0].link, "https://a.example");
        assert_eq!(
            list.entries[1].link,
            "https://news.ycombinator.com/item?id=2"
        );
    }

    #[test]
    fn failure_yields_empty_list() {
        let source = source().with_failure(12);
        let lists = load_all(&source, DEFAULT_SIDEBAR_SIZE);
        assert_eq!(lists.len(), 3);
        assert_eq!(lists[0].entries.len(), 10);
        assert!(lists[1].entries.is_empty());
        assert!(lists[2].entries.is_empty());
    }

    #[test]
    fn lists_come_back_in_sidebar_order() {
        let source = source().with_list(Category::Best, vec![3]);
        let lists = load_all(&source, DEFAULT_SIDEBAR_SIZE);
        let categories: Vec<Category> = lists.iter().map(|list| list.category).collect();
        assert_eq!(categories, SIDEBAR_CATEGORIES.to_vec());
        assert_eq!(lists[1].entries[0].id, 12);
        assert_eq!(lists[2].entries[0].title, "story 3");
    }
}
