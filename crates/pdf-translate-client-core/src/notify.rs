//! Transient banners.
//!
//! Notifications stack independently and are never deduplicated. A transient
//! one expires after a fixed lifetime; dismissing it first makes the later
//! expiry a no-op. Pinned ones stay until dismissed.

use std::time::{Duration, Instant};

/// Shown when the server reports translation is unavailable
pub const API_UNAVAILABLE_NOTICE: &str = "API Key Not Configured: the translation API key is not properly configured. \
     PDF upload and text extraction will work, but translation will not be available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Error,
    Warning,
}

/// A message waiting to be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

/// A notice on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub level: NoticeLevel,
    pub message: String,
    /// `None` for pinned banners
    pub expires_at: Option<Instant>,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    next_id: u64,
    active: Vec<Notification>,
}

impl NotificationCenter {
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 0,
            active: Vec::new(),
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn next_id(&mut self) -> NotificationId {
        self.next_id += 1;
        NotificationId(self.next_id)
    }

    /// Show a transient notice that expires `ttl` after `now`
    pub fn push_at(&mut self, notice: Notice, now: Instant) -> &Notification {
        let id = self.next_id();
        self.insert(Notification {
            id,
            level: notice.level,
            message: notice.message,
            expires_at: Some(now + self.ttl),
        })
    }

    pub fn push(&mut self, notice: Notice) -> &Notification {
        self.push_at(notice, Instant::now())
    }

    /// Show a notice that stays until dismissed
    pub fn pin(&mut self, notice: Notice) -> &Notification {
        let id = self.next_id();
        self.insert(Notification {
            id,
            level: notice.level,
            message: notice.message,
            expires_at: None,
        })
    }

    fn insert(&mut self, notification: Notification) -> &Notification {
        let index = self.active.len();
        self.active.push(notification);
        &self.active[index]
    }

    fn take(&mut self, id: NotificationId) -> Option<Notification> {
        let index = self.active.iter().position(|n| n.id == id)?;
        Some(self.active.remove(index))
    }

    /// Manual dismiss. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        self.take(id).is_some()
    }

    /// Timer-driven removal of one notice; `None` if already dismissed
    pub fn expire(&mut self, id: NotificationId) -> Option<Notification> {
        self.take(id)
    }

    /// Expire every transient notice whose lifetime has passed
    pub fn prune(&mut self, now: Instant) -> Vec<Notification> {
        let due: Vec<NotificationId> = self
            .active
            .iter()
            .filter(|n| n.is_expired(now))
            .map(|n| n.id)
            .collect();
        due.into_iter().filter_map(|id| self.expire(id)).collect()
    }

    /// Everything held, including notices past their lifetime but not yet pruned
    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    /// Notices still on screen at `now`
    pub fn visible(&self, now: Instant) -> impl Iterator<Item = &Notification> {
        self.active.iter().filter(move |n| !n.is_expired(now))
    }
}
