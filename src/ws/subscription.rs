//! Per-connection subscription filter.
//!
//! A connection scopes itself to a set of waitlists (or all of them with
//! `"*"`) and may narrow that further:
//!
//! - to events about particular users, which is how a notifier follows the
//!   people it has to contact;
//! - to the notifiable kinds only ([`WaitlistEvent::is_notifiable`]).
//!
//! Waitlist-level events such as `lottery_drawn` carry no user, so a
//! connection with a user filter never receives them.

use std::collections::HashSet;

use crate::domain::{EventId, UserId, WaitlistEvent};

/// Filter state for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    event_ids: HashSet<EventId>,
    // `"*"`; overrides `event_ids`
    all_events: bool,
    // empty means every user
    user_ids: HashSet<UserId>,
    notifications_only: bool,
}

impl SubscriptionManager {
    /// Creates a filter that matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Widens the waitlist scope. `wildcard` enables `"*"`.
    pub fn subscribe(&mut self, ids: &[EventId], wildcard: bool) {
        self.all_events |= wildcard;
        self.event_ids.extend(ids.iter().copied());
    }

    /// Narrows the waitlist scope. `wildcard` clears `"*"`.
    pub fn unsubscribe(&mut self, ids: &[EventId], wildcard: bool) {
        if wildcard {
            self.all_events = false;
        }
        for id in ids {
            self.event_ids.remove(id);
        }
    }

    /// Adds users to the user filter.
    pub fn follow_users(&mut self, ids: &[UserId]) {
        self.user_ids.extend(ids.iter().copied());
    }

    /// Removes users from the user filter. Removing the last one lifts the
    /// filter.
    pub fn unfollow_users(&mut self, ids: &[UserId]) {
        for id in ids {
            self.user_ids.remove(id);
        }
    }

    /// Restricts delivery to selections and declines.
    pub fn set_notifications_only(&mut self, enabled: bool) {
        self.notifications_only = enabled;
    }

    /// Returns `true` if the event passes every active filter.
    #[must_use]
    pub fn matches(&self, event: &WaitlistEvent) -> bool {
        if !(self.all_events || self.event_ids.contains(&event.event_id())) {
            return false;
        }
        if self.notifications_only && !event.is_notifiable() {
            return false;
        }
        if self.user_ids.is_empty() {
            return true;
        }
        event
            .user_id()
            .is_some_and(|user| self.user_ids.contains(&user))
    }

    /// Number of explicitly subscribed waitlists.
    #[must_use]
    pub fn count(&self) -> usize {
        self.event_ids.len()
    }

    /// Number of followed users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.user_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.all_events
    }

    /// Returns `true` if only notifiable events are delivered.
    #[must_use]
    pub fn is_notifications_only(&self) -> bool {
        self.notifications_only
    }
}
