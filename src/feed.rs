use std::collections::HashSet;

use crate::hackernews::{Category, Item};

pub const DEFAULT_PAGE_SIZE: usize = 7;

/// A page fetch issued against a particular category selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub category: Category,
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Items appended to the display, in retrieved order.
    Rendered(Vec<Item>),
    /// The category changed while the request was in flight.
    Stale,
}

/// Pagination and dedup state for one feed view.
#[derive(Debug, Clone)]
pub struct FeedSession {
    category: Category,
    page_size: usize,
    offset: usize,
    generation: u64,
    seen: HashSet<i64>,
    posts: Vec<Item>,
}

impl FeedSession {
    pub fn new(category: Category, page_size: usize) -> Self {
        Self {
            category,
            page_size: page_size.max(1),
            offset: 0,
            generation: 0,
            seen: HashSet::new(),
            posts: Vec::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn posts(&self) -> &[Item] {
        &self.posts
    }

    pub fn post(&self, id: i64) -> Option<&Item> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn is_seen(&self, id: i64) -> bool {
        self.seen.contains(&id)
    }

    /// Returns true if `id` was not seen before.
    pub fn mark_seen(&mut self, id: i64) -> bool {
        self.seen.insert(id)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Describes the next window to fetch. The offset only moves once the
    /// page is applied.
    pub fn begin_page(&self) -> PageRequest {
        PageRequest {
            generation: self.generation,
            category: self.category,
            start: self.offset,
            len: self.page_size,
        }
    }

    pub fn apply_page(&mut self, request: PageRequest, items: Vec<Item>) -> Applied {
        if !self.is_current(request.generation) || request.start != self.offset {
            return Applied::Stale;
        }

        let mut rendered = Vec::new();
        for item in items {
            if self.seen.insert(item.id) {
                self.posts.push(item.clone());
                rendered.push(item);
            }
        }
        self.offset += request.len;
        Applied::Rendered(rendered)
    }

    /// Full reset: display, offset and dedup set are cleared and every
    /// request issued before this call becomes stale.
    pub fn switch_category(&mut self, category: Category) {
        self.category = category;
        self.offset = 0;
        self.seen.clear();
        self.posts.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ItemSource, StaticItemSource};
    use crate::hackernews::ItemKind;

    fn story(id: i64) -> Item {
        Item {
            id,
            kind: ItemKind::Story,
            title: Some(format!("story {id}")),
            ..Item::default()
        }
    }

    fn source_with(category: Category, ids: &[i64]) -> StaticItemSource {
        let mut source = StaticItemSource::new();
        for &id in ids {
            source = source.with_item(story(id));
        }
        source.with_list(category, ids.to_vec())
    }

    fn load(session: &mut FeedSession, source: &dyn ItemSource) -> Applied {
        let request = session.begin_page();
        let items = source
            .page(request.category, request.start, request.len)
            .unwrap();
        session.apply_page(request, items)
    }

    #[test]
    fn first_page_of_top_stories() {
        let ids: Vec<i64> = (100..120).collect();
        let source = source_with(Category::Top, &ids);
        let mut session = FeedSession::new(Category::Top, 7);

        let Applied::Rendered(items) = load(&mut session, &source) else {
            panic!("expected rendered page");
        };
        let got: Vec<i64> = items.iter().map(|item| item.id).collect();
        assert_eq!(got, (100..107).collect::<Vec<_>>());
        assert_eq!(session.offset(), 7);
        assert_eq!(session.posts().len(), 7);
    }

    #[test]
    fn already_seen_items_are_not_rendered_again() {
        let mut session = FeedSession::new(Category::New, 3);
        session.mark_seen(2);
        let request = session.begin_page();
        let applied = session.apply_page(request, vec![story(1), story(2), story(3)]);
        assert_eq!(applied, Applied::Rendered(vec![story(1), story(3)]));
        assert_eq!(session.offset(), 3);

        // The list shifted under us and repeats 3.
        let request = session.begin_page();
        let applied = session.apply_page(request, vec![story(3), story(4)]);
        assert_eq!(applied, Applied::Rendered(vec![story(4)]));
        assert_eq!(session.offset(), 6);
        assert_eq!(
            session.posts().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 3, 4]
        );
    }

    #[test]
    fn offset_advances_by_page_size_even_when_nothing_is_new() {
        let mut session = FeedSession::new(Category::Top, 7);
        session.mark_seen(1);
        let request = session.begin_page();
        let applied = session.apply_page(request, vec![story(1)]);
        assert_eq!(applied, Applied::Rendered(vec![]));
        assert_eq!(session.offset(), 7);
    }

    #[test]
    fn switching_category_resets_before_next_fetch() {
        let source = source_with(Category::Top, &[1, 2, 3, 4]);
        let mut session = FeedSession::new(Category::Top, 2);
        load(&mut session, &source);
        assert_eq!(session.seen_count(), 2);

        session.switch_category(Category::Ask);
        assert_eq!(session.offset(), 0);
        assert_eq!(session.seen_count(), 0);
        assert!(session.posts().is_empty());
        let request = session.begin_page();
        assert_eq!(request.start, 0);
        assert_eq!(request.category, Category::Ask);
    }

    #[test]
    fn stale_page_is_discarded_after_switch() {
        let mut session = FeedSession::new(Category::Top, 2);
        let in_flight = session.begin_page();
        session.switch_category(Category::Jobs);

        let applied = session.apply_page(in_flight, vec![story(1), story(2)]);
        assert_eq!(applied, Applied::Stale);
        assert_eq!(session.offset(), 0);
        assert!(!session.is_seen(1));
    }

    #[test]
    fn superseded_page_for_same_offset_is_discarded() {
        let mut session = FeedSession::new(Category::Top, 2);
        let first = session.begin_page();
        let duplicate = session.begin_page();
        session.apply_page(first, vec![story(1), story(2)]);
        assert_eq!(session.apply_page(duplicate, vec![story(1)]), Applied::Stale);
        assert_eq!(session.offset(), 2);
    }
}
