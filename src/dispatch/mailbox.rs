// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-slot coalescing mailbox.

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::DispatchError;

#[derive(Debug)]
struct Slot<T> {
    pending: Option<T>,
    closed: bool,
}

/// A one-value handoff between any number of producers and one consumer.
///
/// The mailbox holds at most one pending value. Posting while a value is
/// pending replaces it (last write wins); the displaced value is returned to
/// the poster. The consumer suspends in [`Mailbox::recv`] without polling.
///
/// # Examples
///
/// ```
/// use hearthlink::dispatch::Mailbox;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mailbox = Mailbox::new();
/// mailbox.post(1).unwrap();
/// assert_eq!(mailbox.post(2).unwrap(), Some(1));
///
/// assert_eq!(mailbox.recv().await, Some(2));
///
/// mailbox.close();
/// assert_eq!(mailbox.recv().await, None);
/// # }
/// ```
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    notify: Notify,
}

impl<T> Mailbox<T> {
    /// Creates an empty, open mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Stores `value`, replacing any pending one, and wakes the consumer.
    ///
    /// Returns the value that was replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] if the mailbox has been closed.
    pub fn post(&self, value: T) -> Result<Option<T>, DispatchError> {
        let displaced = {
            let mut slot = self.slot.lock();
            if slot.closed {
                return Err(DispatchError::Closed);
            }
            slot.pending.replace(value)
        };
        // Stores a permit if the consumer is not parked yet.
        self.notify.notify_one();
        Ok(displaced)
    }

    /// Waits for a value.
    ///
    /// Returns `None` once the mailbox is closed; a value still pending at
    /// close is discarded.
    pub async fn recv(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            {
                let mut slot = self.slot.lock();
                if slot.closed {
                    return None;
                }
                if let Some(value) = slot.pending.take() {
                    return Some(value);
                }
            }
            // Woken by a post or a close; the slot is checked again either way.
            notified.await;
        }
    }

    /// Takes the pending value without waiting.
    pub fn try_take(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        if slot.closed {
            return None;
        }
        slot.pending.take()
    }

    /// Closes the mailbox and wakes the consumer.
    ///
    /// Later posts fail and the consumer's `recv` returns `None`.
    pub fn close(&self) {
        {
            let mut slot = self.slot.lock();
            slot.closed = true;
            slot.pending = None;
        }
        self.notify.notify_one();
    }

    /// Returns `true` once [`Mailbox::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }

    /// Returns `true` if a value is waiting to be taken.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.lock().pending.is_some()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
