//! The live-document host: buffers that produce snapshots and publish edits.
//!
//! A `TextBuffer` owns nothing but the current snapshot and the observer
//! list. Edits are serialized under one lock, and change handlers run under
//! that same lock in application order, so observers can never see edit N+1
//! before edit N. The handler list is copied out before dispatch, so a
//! handler registered while an edit is being announced does not hear about
//! that edit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use crate::error::TextError;

use super::range::TextRange;
use super::snapshot::DocumentSnapshot;
use super::tracking::TextChange;

/// A change handler invoked after each edit, in application order.
pub type ChangeHandler = Arc<dyn Fn(&TextChange) + Send + Sync>;

/// Token returned by [`TextBuffer::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Observer {
    id: SubscriptionId,
    handler: ChangeHandler,
}

/// A live document: the collaborator that constructs one snapshot per edit
/// version and feeds the resulting [`TextChange`] to subscribers.
pub struct TextBuffer {
    uri: Url,
    /// Handed to every snapshot as its non-owning back-reference.
    weak_self: Weak<TextBuffer>,
    current: RwLock<Arc<DocumentSnapshot>>,
    /// Serializes edit application and observer dispatch.
    edit_lock: Mutex<()>,
    observers: Mutex<Vec<Observer>>,
    next_subscription: AtomicU64,
}

impl TextBuffer {
    /// Open a buffer with its initial content and version.
    pub fn open(uri: Url, text: String, version: i32) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| Self {
            uri,
            weak_self: weak.clone(),
            current: RwLock::new(Arc::new(DocumentSnapshot::for_buffer(
                weak.clone(),
                text,
                version,
            ))),
            edit_lock: Mutex::new(()),
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        })
    }

    /// The document URI this buffer was opened with.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The snapshot of the most recent version.
    pub fn current(&self) -> Arc<DocumentSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Replace the entire document content, producing the next snapshot.
    ///
    /// This is the full-sync model: the change's old range covers the whole
    /// previous document.
    pub fn set_text(
        &self,
        text: String,
        version: i32,
    ) -> Result<(Arc<DocumentSnapshot>, TextChange), TextError> {
        let _edit = self.edit_lock.lock().unwrap_or_else(|e| e.into_inner());
        let previous = self.current();
        self.check_version(previous.version(), version)?;

        let change = TextChange {
            old_range: TextRange::new(0, previous.len()),
            new_length: text.len(),
            version,
        };
        let snapshot = self.publish(text, version);
        self.dispatch(&change);
        Ok((snapshot, change))
    }

    /// Splice `text` over `range` of the current snapshot, producing the
    /// next snapshot.
    pub fn replace(
        &self,
        range: TextRange,
        text: &str,
        version: i32,
    ) -> Result<(Arc<DocumentSnapshot>, TextChange), TextError> {
        let _edit = self.edit_lock.lock().unwrap_or_else(|e| e.into_inner());
        let previous = self.current();
        self.check_version(previous.version(), version)?;

        if range.end() > previous.len() {
            return Err(TextError::RangeOutOfBounds {
                start: range.start,
                end: range.end(),
                length: previous.len(),
            });
        }
        // Character-boundary validation happens in substring; it never
        // clamps.
        let prefix = previous.substring(TextRange::new(0, range.start))?;
        let suffix = previous.substring(TextRange::from_bounds(range.end()..previous.len()))?;
        let mut content = String::with_capacity(prefix.len() + text.len() + suffix.len());
        content.push_str(prefix);
        content.push_str(text);
        content.push_str(suffix);

        let change = TextChange {
            old_range: range,
            new_length: text.len(),
            version,
        };
        let snapshot = self.publish(content, version);
        self.dispatch(&change);
        Ok((snapshot, change))
    }

    /// Register a change handler. Handlers run synchronously after each
    /// edit, in the order edits were applied; a handler must not apply
    /// edits to the same buffer re-entrantly.
    pub fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Observer { id, handler });
        id
    }

    /// Remove a previously registered handler. Returns whether it was still
    /// registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.lock().unwrap_or_else(|e| e.into_inner());
        let before = observers.len();
        observers.retain(|observer| observer.id != id);
        observers.len() != before
    }

    fn check_version(&self, current: i32, proposed: i32) -> Result<(), TextError> {
        if proposed <= current {
            return Err(TextError::NonMonotonicVersion { current, proposed });
        }
        Ok(())
    }

    fn publish(&self, content: String, version: i32) -> Arc<DocumentSnapshot> {
        let snapshot = Arc::new(DocumentSnapshot::for_buffer(
            self.weak_self.clone(),
            content,
            version,
        ));
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&snapshot);
        drop(guard);
        snapshot
    }

    fn dispatch(&self, change: &TextChange) {
        // Snapshot the handler list so a subscribe() racing with dispatch
        // does not receive this edit.
        let handlers: Vec<ChangeHandler> = self
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|observer| Arc::clone(&observer.handler))
            .collect();
        for handler in handlers {
            handler(change);
        }
    }
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("uri", &self.uri)
            .field("version", &self.current().version())
            .finish_non_exhaustive()
    }
}

/// Thread-safe registry of open buffers, keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    buffers: DashMap<Url, Arc<TextBuffer>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            buffers: DashMap::new(),
        }
    }

    /// Open a buffer, or replace the content of an already-open one.
    ///
    /// Re-opening an existing URI updates the buffer in place so existing
    /// subscriptions and snapshots keep working. Lookup and insertion are a
    /// single map operation, so concurrent first opens of one URI all
    /// resolve to the same buffer.
    pub fn open(
        &self,
        uri: Url,
        text: String,
        version: i32,
    ) -> Result<Arc<TextBuffer>, TextError> {
        let existing = match self.buffers.entry(uri.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let buffer = TextBuffer::open(uri, text, version);
                entry.insert(Arc::clone(&buffer));
                return Ok(buffer);
            }
        };
        // The shard lock is released before set_text so change handlers may
        // touch the store again.
        existing.set_text(text, version)?;
        Ok(existing)
    }

    /// Look up an open buffer.
    pub fn get(&self, uri: &Url) -> Option<Arc<TextBuffer>> {
        self.buffers.get(uri).map(|entry| Arc::clone(&entry))
    }

    /// Close a buffer. Snapshots held by consumers stay valid; the buffer
    /// itself lives as long as any of them needs the back-reference.
    pub fn close(&self, uri: &Url) {
        self.buffers.remove(uri);
    }

    /// Number of open buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether no buffers are open.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
