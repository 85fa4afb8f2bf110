//! Dirty/clean cache-invalidation ledger
//!
//! One ledger instance is shared by handle across every consumer: two
//! independent views observe the same freshness bits without explicit
//! wiring. Freshness is three-valued per key - `NeverLoaded` forces the
//! first refresh after unlock even though nothing marked it dirty yet.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Cached resource identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Native balance
    Balance,
    /// Token holdings
    Tokens,
    /// Recent transaction history
    TransactionHistory,
}

/// Every concrete cache key
pub const CACHE_KEYS: [CacheKey; 3] = [
    CacheKey::Balance,
    CacheKey::Tokens,
    CacheKey::TransactionHistory,
];

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balance => write!(f, "balance"),
            Self::Tokens => write!(f, "tokens"),
            Self::TransactionHistory => write!(f, "transaction_history"),
        }
    }
}

/// A key, or all of them
///
/// `All` is sugar over iterating every concrete key; it is never itself a
/// stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSelector {
    /// A single key
    One(CacheKey),
    /// Every concrete key
    All,
}

impl From<CacheKey> for CacheSelector {
    fn from(key: CacheKey) -> Self {
        Self::One(key)
    }
}

impl CacheSelector {
    fn keys(self) -> impl Iterator<Item = CacheKey> {
        let keys: Vec<CacheKey> = match self {
            Self::One(key) => vec![key],
            Self::All => CACHE_KEYS.to_vec(),
        };
        keys.into_iter()
    }
}

/// Per-key freshness state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// No successful load has happened this session
    #[default]
    NeverLoaded,
    /// Loaded and not invalidated since
    Clean,
    /// Invalidated; the next refresh must re-query
    Dirty,
}

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    freshness: Freshness,
    last_updated: Option<SystemTime>,
}

type Listener = Arc<dyn Fn(CacheSelector) + Send + Sync>;

/// Subscription handle returned by [`CacheLedger::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    listeners: HashMap<u64, Listener>,
    next_listener_id: u64,
}

/// Shared dirty/clean registry with synchronous listener fan-out
///
/// Safe to call from concurrent refresh flows; the map is guarded
/// internally. The ledger never returns errors - misuse is only logged.
#[derive(Default)]
pub struct CacheLedger {
    inner: RwLock<Inner>,
}

impl CacheLedger {
    /// Create a fresh ledger with every key `NeverLoaded`
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark the selection dirty
    pub fn mark_dirty(&self, selector: impl Into<CacheSelector>) {
        let selector: CacheSelector = selector.into();
        let now = SystemTime::now();
        {
            let mut inner = self.inner.write();
            for key in selector.keys() {
                let entry = inner.entries.entry(key).or_default();
                entry.freshness = Freshness::Dirty;
                entry.last_updated = Some(now);
            }
        }
        debug!(selector = %DisplaySelector(selector), "Cache marked dirty");
        self.notify(selector);
    }

    /// Mark the selection clean
    ///
    /// Only call after a refresh completed without error and actually
    /// fetched fresh data; a refresh that fails must leave the dirty bit
    /// untouched so the next attempt retries.
    pub fn mark_clean(&self, selector: impl Into<CacheSelector>) {
        let selector: CacheSelector = selector.into();
        let now = SystemTime::now();
        {
            let mut inner = self.inner.write();
            for key in selector.keys() {
                let entry = inner.entries.entry(key).or_default();
                entry.freshness = Freshness::Clean;
                entry.last_updated = Some(now);
            }
        }
        debug!(selector = %DisplaySelector(selector), "Cache marked clean");
        self.notify(selector);
    }

    /// Check dirtiness; for `All`, true if any concrete key is dirty
    pub fn is_dirty(&self, selector: impl Into<CacheSelector>) -> bool {
        let selector: CacheSelector = selector.into();
        let inner = self.inner.read();
        selector.keys().any(|key| {
            matches!(
                inner.entries.get(&key).copied().unwrap_or_default().freshness,
                Freshness::Dirty
            )
        })
    }

    /// Current freshness of a key
    pub fn freshness(&self, key: CacheKey) -> Freshness {
        self.inner
            .read()
            .entries
            .get(&key)
            .copied()
            .unwrap_or_default()
            .freshness
    }

    /// Whether a refresh routine must re-query the network
    ///
    /// Skipping is only allowed when the key has been loaded successfully
    /// at least once this session, has not been invalidated since, and
    /// the caller is not forcing.
    pub fn needs_refresh(&self, key: CacheKey, force: bool) -> bool {
        force || self.freshness(key) != Freshness::Clean
    }

    /// Last state change of a key; for `All`, the most recent across keys
    pub fn last_updated(&self, selector: impl Into<CacheSelector>) -> Option<SystemTime> {
        let selector: CacheSelector = selector.into();
        let inner = self.inner.read();
        selector
            .keys()
            .filter_map(|key| inner.entries.get(&key).and_then(|e| e.last_updated))
            .max()
    }

    /// Register a listener for invalidation events
    pub fn subscribe(&self, listener: impl Fn(CacheSelector) + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = self.inner.write();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.insert(id, Arc::new(listener));
        SubscriptionId(id)
    }

    /// Remove a listener; unknown ids are logged, never an error
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.inner.write().listeners.remove(&id.0).is_none() {
            warn!(id = id.0, "Unsubscribe for unknown cache listener");
        }
    }

    // Synchronous best-effort fan-out. Listeners run outside the lock so
    // they may consult the ledger; a panicking listener must not stop the
    // others.
    fn notify(&self, selector: CacheSelector) {
        let listeners: Vec<Listener> = self.inner.read().listeners.values().cloned().collect();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(selector))).is_err() {
                warn!("Cache listener panicked during fan-out");
            }
        }
    }

    // ------------------------------------------------------------------
    // Invalidation shorthands for the common mutation sites
    // ------------------------------------------------------------------

    /// After a completed transfer: balance, tokens, and history are stale
    pub fn invalidate_after_transfer(&self) {
        self.mark_dirty(CacheKey::Balance);
        self.mark_dirty(CacheKey::Tokens);
        self.mark_dirty(CacheKey::TransactionHistory);
    }

    /// After wallet identity changes (load, generate, import, disconnect)
    pub fn invalidate_after_wallet_change(&self) {
        self.mark_dirty(CacheSelector::All);
    }

    /// After operations that touch funds but not history
    pub fn invalidate_balance_and_tokens(&self) {
        self.mark_dirty(CacheKey::Balance);
        self.mark_dirty(CacheKey::Tokens);
    }
}

// Small helper so selectors read well in log lines
struct DisplaySelector(CacheSelector);

impl fmt::Display for DisplaySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            CacheSelector::One(key) => write!(f, "{}", key),
            CacheSelector::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_starts_never_loaded_and_not_dirty() {
        let ledger = CacheLedger::new();
        for key in CACHE_KEYS {
            assert_eq!(ledger.freshness(key), Freshness::NeverLoaded);
            assert!(!ledger.is_dirty(key));
            // A never-loaded key still needs its first refresh
            assert!(ledger.needs_refresh(key, false));
        }
    }

    #[test]
    fn test_dirty_until_explicit_clean() {
        let ledger = CacheLedger::new();
        ledger.mark_dirty(CacheKey::Balance);
        assert!(ledger.is_dirty(CacheKey::Balance));
        assert!(ledger.needs_refresh(CacheKey::Balance, false));

        // A refresh that fails never calls mark_clean; dirtiness holds
        assert!(ledger.is_dirty(CacheKey::Balance));

        ledger.mark_clean(CacheKey::Balance);
        assert!(!ledger.is_dirty(CacheKey::Balance));
        assert!(!ledger.needs_refresh(CacheKey::Balance, false));
        assert!(ledger.needs_refresh(CacheKey::Balance, true));
    }

    #[test]
    fn test_all_marks_every_concrete_key() {
        let ledger = CacheLedger::new();
        ledger.mark_dirty(CacheSelector::All);
        for key in CACHE_KEYS {
            assert!(ledger.is_dirty(key));
        }
        assert!(ledger.is_dirty(CacheSelector::All));

        ledger.mark_clean(CacheSelector::All);
        assert!(!ledger.is_dirty(CacheSelector::All));
    }

    #[test]
    fn test_all_dirty_if_any_key_dirty() {
        let ledger = CacheLedger::new();
        ledger.mark_clean(CacheSelector::All);
        ledger.mark_dirty(CacheKey::Tokens);
        assert!(ledger.is_dirty(CacheSelector::All));
        assert!(!ledger.is_dirty(CacheKey::Balance));
    }

    #[test]
    fn test_last_updated_tracks_max() {
        let ledger = CacheLedger::new();
        assert!(ledger.last_updated(CacheSelector::All).is_none());

        ledger.mark_clean(CacheKey::Balance);
        let first = ledger.last_updated(CacheKey::Balance).unwrap();
        ledger.mark_dirty(CacheKey::Tokens);
        let all = ledger.last_updated(CacheSelector::All).unwrap();
        assert!(all >= first);
    }

    #[test]
    fn test_listener_fanout_and_unsubscribe() {
        let ledger = CacheLedger::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_a = hits.clone();
        let a = ledger.subscribe(move |_| {
            hits_a.fetch_add(1, Ordering::SeqCst);
        });
        let hits_b = hits.clone();
        let _b = ledger.subscribe(move |_| {
            hits_b.fetch_add(1, Ordering::SeqCst);
        });

        ledger.mark_dirty(CacheKey::Balance);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        ledger.unsubscribe(a);
        ledger.mark_clean(CacheKey::Balance);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_fanout() {
        let ledger = CacheLedger::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _bad = ledger.subscribe(|_| panic!("listener bug"));
        let hits_ok = hits.clone();
        let _ok = ledger.subscribe(move |_| {
            hits_ok.fetch_add(1, Ordering::SeqCst);
        });

        ledger.mark_dirty(CacheSelector::All);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        // The mutation itself took effect despite the panic
        assert!(ledger.is_dirty(CacheKey::Balance));
    }

    #[test]
    fn test_listeners_may_consult_the_ledger() {
        let ledger = CacheLedger::new();
        let observed = Arc::new(AtomicUsize::new(0));

        let ledger_ref = ledger.clone();
        let observed_ref = observed.clone();
        let _sub = ledger.subscribe(move |_| {
            if ledger_ref.is_dirty(CacheKey::Balance) {
                observed_ref.fetch_add(1, Ordering::SeqCst);
            }
        });

        ledger.mark_dirty(CacheKey::Balance);
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }
}
