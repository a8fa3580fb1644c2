//! Observable UI state: the todo list and the id being edited.
//!
//! # Design
//! `Store` is an owned, single-writer value. Mutation goes through `&mut
//! self`, so there is never more than one writer and no locking. Front-ends
//! register callbacks with `subscribe`; every setter invokes each callback
//! once, in registration order, with the new state.
//!
//! List refreshes are sequenced with `FetchTicket`s. A ticket is taken when a
//! list request is issued and presented again with the response; a response
//! whose ticket is older than the last applied one is dropped, so a slow
//! refetch can never overwrite a newer list.

use std::fmt;

use tracing::debug;

use crate::types::{Todo, TodoId};

/// Snapshot handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub list: Vec<Todo>,
    pub editing_id: Option<TodoId>,
}

/// Handle returned by `Store::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Sequence number of an issued list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

type Callback = Box<dyn FnMut(&StoreState)>;

#[derive(Default)]
pub struct Store {
    state: StoreState,
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_subscription: u64,
    issued: u64,
    applied: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn list(&self) -> &[Todo] {
        &self.state.list
    }

    pub fn editing_id(&self) -> Option<TodoId> {
        self.state.editing_id
    }

    /// The list entry currently open for editing, if it is still present.
    pub fn editing_todo(&self) -> Option<&Todo> {
        let id = self.state.editing_id?;
        self.state.list.iter().find(|t| t.id == Some(id))
    }

    /// Replace the list wholesale.
    pub fn set_list(&mut self, items: Vec<Todo>) {
        self.state.list = items;
        self.notify();
    }

    /// `None` leaves edit mode.
    pub fn set_editing_id(&mut self, id: Option<TodoId>) {
        self.state.editing_id = id;
        self.notify();
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Reserve a ticket for a list request about to be issued.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Apply a fetched list if no newer fetch has been applied already.
    ///
    /// Returns whether the list was applied.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, items: Vec<Todo>) -> bool {
        if ticket.0 <= self.applied {
            debug!(
                ticket = ticket.0,
                applied = self.applied,
                "dropping stale todo list"
            );
            return false;
        }
        self.applied = ticket.0;
        self.set_list(items);
        true
    }

    fn notify(&mut self) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&self.state);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .field("issued", &self.issued)
            .field("applied", &self.applied)
            .finish()
    }
}
