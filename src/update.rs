use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::feed::FeedSession;
use crate::hackernews::{Item, Updates};

pub const BANNER_MESSAGE: &str = "New updates available!";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_SHOWN: usize = 5;
pub const DEFAULT_BANNER_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEntry {
    pub id: i64,
    pub label: String,
    pub link: String,
}

impl UpdateEntry {
    fn from_item(item: &Item) -> Self {
        let summary = item
            .title
            .as_deref()
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .or_else(|| item.text.as_deref().map(crate::text::plain))
            .unwrap_or_default();
        Self {
            id: item.id,
            label: format!("{}: {}", item.kind, summary),
            link: item.link(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Digest {
    pub shown: Vec<UpdateEntry>,
    /// Unseen items marked seen but cut from the side list.
    pub dropped: usize,
}

/// Tracks the live-updates side list and the banner cooldown.
#[derive(Debug)]
pub struct Poller {
    cooldown: Duration,
    max_shown: usize,
    last_notice: Instant,
    entries: Vec<UpdateEntry>,
}

impl Poller {
    /// The cooldown clock starts now, so no banner shows during the first
    /// `cooldown` of a session.
    pub fn new(cooldown: Duration, max_shown: usize, now: Instant) -> Self {
        Self {
            cooldown,
            max_shown,
            last_notice: now,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[UpdateEntry] {
        &self.entries
    }

    /// Returns true when a banner should be shown for this snapshot.
    pub fn observe(&mut self, snapshot: &Updates, now: Instant) -> bool {
        if snapshot.is_empty() {
            return false;
        }
        if now.saturating_duration_since(self.last_notice) >= self.cooldown {
            self.last_notice = now;
            return true;
        }
        false
    }

    /// Replaces the side list with the first unseen items of the snapshot.
    /// Every unseen item is marked seen, including those past the cutoff.
    pub fn digest(&mut self, resolved: Vec<Item>, session: &mut FeedSession) -> Digest {
        let mut shown = Vec::new();
        let mut dropped = 0;
        for item in resolved {
            if !session.mark_seen(item.id) {
                continue;
            }
            if shown.len() < self.max_shown {
                shown.push(UpdateEntry::from_item(&item));
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            info!(dropped, shown = shown.len(), "update items cut from side list");
        }
        debug!(shown = shown.len(), "side list refreshed");
        self.entries = shown.clone();
        Digest { shown, dropped }
    }
}

/// Transient message that hides itself after `duration`.
#[derive(Debug, Clone)]
pub struct Notification {
    message: String,
    shown_at: Instant,
    duration: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, now: Instant, duration: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at: now,
            duration,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.duration
    }
}
