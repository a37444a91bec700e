//! Per-connection subscription session.
//!
//! A session is the shared state between the two threads of an active
//! subscription: the host thread parked in the consumption loop and the
//! native client's delivery thread feeding the queue. Everything the two
//! sides both touch lives under one mutex; `in_blocking_mode` alone is
//! read from other host calls and is atomic instead.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

use crate::client::Client;
use crate::pubsub::message::PushMessage;

/// Host callback invoked once per delivered message, on the thread that
/// called subscribe. Receives `(owner, channel, payload, pattern)`; the
/// pattern is present only for pattern-subscription delivery.
pub type MessageHandler = Arc<dyn Fn(&Client, Bytes, Bytes, Option<Bytes>) + Send + Sync>;

/// State guarded by the session mutex.
struct SessionState {
    /// FIFO delivery queue; empty means nothing pending
    queue: VecDeque<PushMessage>,
    /// Channel/pattern names this session is subscribed to
    subscribed: HashSet<Bytes>,
    /// Cleared on teardown; the consumption loop exits once it sees false
    active: bool,
}

/// Pub/sub state for one client connection.
///
/// Exclusively owned by the registry entry; holds the owning client alive
/// for its own lifetime. The client never references the session back.
pub struct SubscriptionSession {
    owner: Client,
    handler: MessageHandler,
    state: Mutex<SessionState>,
    not_empty: Condvar,
    in_blocking_mode: AtomicBool,
}

impl SubscriptionSession {
    /// Creates an active session with an empty queue and no subscriptions.
    pub fn new(owner: Client, handler: MessageHandler) -> Self {
        SubscriptionSession {
            owner,
            handler,
            state: Mutex::new(SessionState {
                queue: VecDeque::new(),
                subscribed: HashSet::new(),
                active: true,
            }),
            not_empty: Condvar::new(),
            in_blocking_mode: AtomicBool::new(false),
        }
    }

    /// The client this session delivers for.
    #[inline]
    pub fn owner(&self) -> &Client {
        &self.owner
    }

    /// Appends a message and wakes the consumer.
    ///
    /// Returns false without queueing when the session is no longer
    /// active; the caller treats that as a benign teardown race.
    pub fn enqueue(&self, msg: PushMessage) -> bool {
        let mut state = self.state.lock();
        if !state.active {
            return false;
        }
        state.queue.push_back(msg);
        self.not_empty.notify_one();
        true
    }

    /// Blocks until a message is queued or the session leaves its running
    /// state, then dequeues in FIFO order.
    ///
    /// May return a message even after deactivation: one already-queued
    /// node is still handed out per wake so the consumer drains what it
    /// was signalled for. `None` means woken with nothing to deliver.
    pub fn wait_next(&self) -> Option<PushMessage> {
        let mut state = self.state.lock();
        while state.queue.is_empty() && state.active && !state.subscribed.is_empty() {
            self.not_empty.wait(&mut state);
        }
        state.queue.pop_front()
    }

    /// Loop condition for the consumer: active with live subscriptions.
    pub fn should_run(&self) -> bool {
        let state = self.state.lock();
        state.active && !state.subscribed.is_empty()
    }

    /// Invokes the host handler for one dequeued message.
    ///
    /// Called with no locks held; the handler may issue unsubscribe-class
    /// calls against this same session.
    pub fn dispatch(&self, msg: PushMessage) {
        (self.handler)(&self.owner, msg.channel, msg.payload, msg.pattern);
    }

    /// Records newly acknowledged subscriptions.
    pub fn add_subscriptions<I>(&self, names: I)
    where
        I: IntoIterator<Item = Bytes>,
    {
        let mut state = self.state.lock();
        state.subscribed.extend(names);
    }

    /// Drops the given subscriptions; unknown names are ignored.
    ///
    /// When the set drains to empty the session deactivates and the
    /// consumer is woken so it observes the exit condition.
    pub fn remove_subscriptions<'a, I>(&self, names: I)
    where
        I: IntoIterator<Item = &'a Bytes>,
    {
        let mut state = self.state.lock();
        for name in names {
            state.subscribed.remove(name);
        }
        if state.subscribed.is_empty() {
            state.active = false;
            self.not_empty.notify_one();
        }
    }

    /// Drops every subscription and deactivates.
    pub fn clear_subscriptions(&self) {
        let mut state = self.state.lock();
        state.subscribed.clear();
        state.active = false;
        self.not_empty.notify_one();
    }

    /// Deactivates and wakes the consumer without touching the subscribed
    /// set. Used by registry teardown.
    pub fn deactivate(&self) {
        let mut state = self.state.lock();
        state.active = false;
        self.not_empty.notify_one();
    }

    /// Teardown: deactivate, wake the consumer, and free every queued but
    /// undelivered message.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.active = false;
        state.queue.clear();
        self.not_empty.notify_one();
    }

    /// Whether the session still accepts deliveries.
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscribed.len()
    }

    /// Whether the given channel/pattern name is currently subscribed.
    pub fn is_subscribed(&self, name: &[u8]) -> bool {
        self.state.lock().subscribed.contains(name)
    }

    /// Number of queued, undelivered messages.
    pub fn queued_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// True while the consumption loop runs on this session.
    #[inline]
    pub fn in_blocking_mode(&self) -> bool {
        self.in_blocking_mode.load(Ordering::Acquire)
    }

    /// Set by the consumption loop at entry and exit.
    #[inline]
    pub fn set_blocking_mode(&self, blocking: bool) {
        self.in_blocking_mode.store(blocking, Ordering::Release);
    }
}

impl std::fmt::Debug for SubscriptionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SubscriptionSession")
            .field("client", &self.owner.id())
            .field("active", &state.active)
            .field("subscribed", &state.subscribed.len())
            .field("queued", &state.queue.len())
            .field("in_blocking_mode", &self.in_blocking_mode())
            .finish()
    }
}
