//! Shelter list loading, catalog sync and browsing helpers.

use std::collections::{BTreeSet, HashSet};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::error::BackendError;
use crate::model::{NewShelter, Shelter, ShelterLoadFailure, ShelterType, NEWEST_FIRST};
use crate::traits::ShelterStore;

/// Retry schedule for the shelter list fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each retry after it.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based): 1s, 2s, 4s by default.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Outcome of loading the shelter list.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelterLoad {
    pub shelters: Vec<Shelter>,
    /// Set when every attempt failed and `shelters` is the demo set.
    pub failure: Option<ShelterLoadFailure>,
}

/// Fetches the shelter list, retrying with exponential backoff and falling
/// back to [`demo_shelters`] so callers always have something to show.
#[derive(Debug, Clone, Default)]
pub struct ShelterLoader {
    policy: RetryPolicy,
}

impl ShelterLoader {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn load<S>(&self, store: &S, sort: Option<&str>) -> ShelterLoad
    where
        S: ShelterStore + ?Sized,
    {
        self.load_with(store, sort, |delay| {
            thread::sleep(delay);
            true
        })
    }

    /// Like [`load`](Self::load), but backs off through `wait`.
    ///
    /// `wait` is handed each retry delay and returns `false` to give up;
    /// the demo fallback is then returned with the retries made so far.
    pub fn load_with<S, W>(&self, store: &S, sort: Option<&str>, mut wait: W) -> ShelterLoad
    where
        S: ShelterStore + ?Sized,
        W: FnMut(Duration) -> bool,
    {
        let mut retry = 0;
        loop {
            let err = match store.list(sort) {
                Ok(shelters) => {
                    debug!(count = shelters.len(), retry, "loaded shelters");
                    return ShelterLoad {
                        shelters,
                        failure: None,
                    };
                }
                Err(err) => err,
            };

            if retry >= self.policy.max_retries {
                error!(error = %err, retries = retry, "shelter list unavailable, using demo shelters");
                return self.fallback(retry, &err);
            }

            let delay = self.policy.delay_for(retry);
            warn!(
                error = %err,
                retry = retry + 1,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "shelter list fetch failed, retrying"
            );
            if !wait(delay) {
                debug!(retries = retry, "shelter list retries abandoned");
                return self.fallback(retry, &err);
            }
            retry += 1;
        }
    }

    fn fallback(&self, retries: u32, err: &BackendError) -> ShelterLoad {
        ShelterLoad {
            shelters: demo_shelters(),
            failure: Some(ShelterLoadFailure {
                retries,
                max_retries: self.policy.max_retries,
                last_error: err.to_string(),
            }),
        }
    }
}

/// Built-in shelters used when the backend cannot be reached.
pub fn demo_shelters() -> Vec<Shelter> {
    let demo = |id: &str, name: &str, address: &str, city: &str, lat: f64, lng: f64, capacity: u32| Shelter {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        city: city.to_string(),
        latitude: lat,
        longitude: lng,
        capacity,
        kind: ShelterType::Public,
        accessibility: true,
        operating_hours: Some("24/7".to_string()),
        notes: Some("Demo shelter".to_string()),
    };

    vec![
        demo(
            "demo-1",
            "מקלט ציבורי תל אביב מרכז",
            "רחוב דיזנגוף 100, תל אביב",
            "תל אביב",
            32.0809,
            34.7806,
            150,
        ),
        demo(
            "demo-2",
            "מקלט ציבורי חולון",
            "רחוב יצחק רבין 20, חולון",
            "חולון",
            32.0117,
            34.7628,
            120,
        ),
    ]
}

/// The national shelters the periodic sync makes sure exist.
pub fn national_catalog() -> Vec<NewShelter> {
    let public = |name: &str, address: &str, city: &str, lat: f64, lng: f64, capacity: u32, notes: &str| NewShelter {
        name: name.to_string(),
        address: address.to_string(),
        city: city.to_string(),
        latitude: lat,
        longitude: lng,
        capacity,
        kind: ShelterType::Public,
        accessibility: true,
        operating_hours: Some("24/7".to_string()),
        notes: Some(notes.to_string()),
    };

    vec![
        public(
            "מקלט ציבורי ירושלים מרכז",
            "רחוב יפו 50, ירושלים",
            "ירושלים",
            31.7857,
            35.2066,
            200,
            "Main public shelter",
        ),
        public(
            "מקלט ציבורי חיפה כרמל",
            "רחוב הרצל 80, חיפה",
            "חיפה",
            32.8191,
            34.9983,
            180,
            "Central public shelter",
        ),
        public(
            "מקלט ציבורי באר שבע",
            "רחוב בן גוריון 30, באר שבע",
            "באר שבע",
            31.2518,
            34.7915,
            160,
            "Southern public shelter",
        ),
    ]
}

/// Insert the catalog entries whose names are not stored yet.
///
/// Names are compared case-insensitively. Returns how many were added.
pub fn sync_catalog<S>(store: &S, catalog: &[NewShelter]) -> Result<usize, BackendError>
where
    S: ShelterStore + ?Sized,
{
    let existing: HashSet<String> = store
        .list(None)?
        .into_iter()
        .map(|shelter| shelter.name.to_lowercase())
        .collect();

    let missing: Vec<NewShelter> = catalog
        .iter()
        .filter(|shelter| !existing.contains(&shelter.name.to_lowercase()))
        .cloned()
        .collect();

    if missing.is_empty() {
        debug!("shelter catalog already up to date");
        return Ok(0);
    }

    store.bulk_create(&missing)?;
    info!(added = missing.len(), "added shelters from catalog");
    Ok(missing.len())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShelterSnapshot {
    pub shelters: Vec<Shelter>,
    pub failure: Option<ShelterLoadFailure>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Latest shelter list, shared between the sync task and its readers.
#[derive(Debug, Clone, Default)]
pub struct SharedShelters {
    inner: Arc<RwLock<ShelterSnapshot>>,
}

impl SharedShelters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ShelterSnapshot {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn replace(&self, load: ShelterLoad) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = ShelterSnapshot {
            shelters: load.shelters,
            failure: load.failure,
            refreshed_at: Some(Utc::now()),
        };
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub interval: Duration,
    pub retry: RetryPolicy,
    pub catalog: Vec<NewShelter>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            catalog: national_catalog(),
        }
    }
}

/// Periodic background sync of the shelter catalog.
///
/// The list is loaded into a [`SharedShelters`] as soon as the task starts.
/// Each tick after that adds missing catalog shelters and, if that worked,
/// reloads the list. Ticks are not coordinated with route analyses.
pub struct ShelterSync;

impl ShelterSync {
    /// Start the sync thread. The first tick runs one interval after start.
    pub fn spawn<S>(
        store: Arc<S>,
        shared: SharedShelters,
        config: SyncConfig,
    ) -> std::io::Result<SyncHandle>
    where
        S: ShelterStore + Send + Sync + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let loader = ShelterLoader::new(config.retry.clone());

        let thread = thread::Builder::new()
            .name("shelter-sync".to_string())
            .spawn(move || {
                info!(interval_secs = config.interval.as_secs(), "shelter sync started");

                // A load interrupted by cancellation is not published.
                let refresh = || {
                    let load = loader.load_with(store.as_ref(), Some(NEWEST_FIRST), |delay| {
                        wait_uncancelled(&cancelled, delay)
                    });
                    if is_cancelled(&cancelled) {
                        return false;
                    }
                    shared.replace(load);
                    true
                };

                if refresh() {
                    while wait_uncancelled(&cancelled, config.interval) {
                        match sync_catalog(store.as_ref(), &config.catalog) {
                            Ok(_) => {
                                if !refresh() {
                                    break;
                                }
                            }
                            Err(err) => {
                                warn!(error = %err, "shelter sync failed, will retry next tick");
                            }
                        }
                    }
                }
                info!("shelter sync stopped");
            })?;

        Ok(SyncHandle {
            cancel: Some(cancel),
            thread: Some(thread),
        })
    }
}

/// Sleep for `delay` unless cancelled first. Returns whether the full delay passed.
fn wait_uncancelled(cancelled: &Receiver<()>, delay: Duration) -> bool {
    matches!(cancelled.recv_timeout(delay), Err(RecvTimeoutError::Timeout))
}

fn is_cancelled(cancelled: &Receiver<()>) -> bool {
    !matches!(cancelled.try_recv(), Err(TryRecvError::Empty))
}

/// Owner of a running [`ShelterSync`]; stopping or dropping it cancels the task.
#[derive(Debug)]
pub struct SyncHandle {
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Cancel the task and wait for an in-progress tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("shelter sync thread panicked");
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Browsing filter over a shelter list. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShelterFilter {
    /// Case-insensitive substring of name, address or city.
    pub search: Option<String>,
    pub kind: Option<ShelterType>,
    pub accessible: Option<bool>,
    pub city: Option<String>,
}

impl ShelterFilter {
    pub fn matches(&self, shelter: &Shelter) -> bool {
        let search = self
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|term| !term.is_empty());
        if let Some(term) = search {
            let hit = [&shelter.name, &shelter.address, &shelter.city]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        self.kind.is_none_or(|kind| kind == shelter.kind)
            && self.accessible.is_none_or(|accessible| accessible == shelter.accessibility)
            && self.city.as_ref().is_none_or(|city| *city == shelter.city)
    }

    pub fn apply<'a>(&self, shelters: &'a [Shelter]) -> Vec<&'a Shelter> {
        shelters.iter().filter(|shelter| self.matches(shelter)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShelterStats {
    pub total: usize,
    pub public: usize,
    pub accessible: usize,
    pub cities: usize,
}

impl ShelterStats {
    pub fn from_shelters<'a, I>(shelters: I) -> Self
    where
        I: IntoIterator<Item = &'a Shelter>,
    {
        let mut stats = ShelterStats::default();
        let mut cities = HashSet::new();
        for shelter in shelters {
            stats.total += 1;
            if shelter.kind == ShelterType::Public {
                stats.public += 1;
            }
            if shelter.accessibility {
                stats.accessible += 1;
            }
            cities.insert(shelter.city.as_str());
        }
        stats.cities = cities.len();
        stats
    }
}

/// Distinct non-empty city names, sorted.
pub fn cities(shelters: &[Shelter]) -> Vec<String> {
    shelters
        .iter()
        .map(|shelter| shelter.city.as_str())
        .filter(|city| !city.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store whose listings always fail.
    struct DownStore {
        calls: std::cell::Cell<u32>,
    }

    impl ShelterStore for DownStore {
        fn list(&self, _sort: Option<&str>) -> Result<Vec<Shelter>, BackendError> {
            self.calls.set(self.calls.get() + 1);
            Err(BackendError::Unavailable("timeout".to_string()))
        }

        fn bulk_create(&self, _shelters: &[NewShelter]) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[test]
    fn test_loader_waits_with_backoff_schedule() {
        let store = DownStore { calls: Default::default() };
        let mut waits = Vec::new();
        let load = ShelterLoader::default().load_with(&store, None, |delay| {
            waits.push(delay);
            true
        });

        assert_eq!(store.calls.get(), 4);
        assert_eq!(
            waits,
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert_eq!(load.failure.map(|f| f.retries), Some(3));
    }

    #[test]
    fn test_loader_gives_up_when_wait_declines() {
        let store = DownStore { calls: Default::default() };
        let load = ShelterLoader::default().load_with(&store, None, |_| false);

        assert_eq!(store.calls.get(), 1);
        assert_eq!(load.shelters, demo_shelters());
        let failure = load.failure.unwrap();
        assert_eq!((failure.retries, failure.max_retries), (0, 3));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(RetryPolicy::immediate(3).delay_for(2), Duration::ZERO);
    }

    #[test]
    fn test_demo_set_has_two_public_shelters() {
        let demo = demo_shelters();
        assert_eq!(demo.len(), 2);
        assert_eq!(demo[0].id, "demo-1");
        assert_eq!(demo[1].id, "demo-2");
        assert!(demo.iter().all(|s| s.kind == ShelterType::Public && s.accessibility));
    }

    #[test]
    fn test_filter_by_search_and_fields() {
        let mut shelters = demo_shelters();
        shelters[1].accessibility = false;

        let by_city = ShelterFilter {
            search: Some("חולון".to_string()),
            ..Default::default()
        };
        assert_eq!(by_city.apply(&shelters).len(), 1);

        let accessible = ShelterFilter {
            accessible: Some(true),
            ..Default::default()
        };
        let ids: Vec<&str> = accessible.apply(&shelters).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["demo-1"]);

        let private = ShelterFilter {
            kind: Some(ShelterType::Private),
            ..Default::default()
        };
        assert!(private.apply(&shelters).is_empty());

        let blank = ShelterFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(blank.apply(&shelters).len(), 2);
    }

    #[test]
    fn test_stats_and_cities() {
        let mut shelters = demo_shelters();
        shelters.push(national_catalog().remove(0).with_id("j1"));
        shelters[0].kind = ShelterType::Commercial;

        let stats = ShelterStats::from_shelters(&shelters);
        assert_eq!(
            stats,
            ShelterStats {
                total: 3,
                public: 2,
                accessible: 3,
                cities: 3,
            }
        );
        assert_eq!(cities(&shelters), vec!["חולון", "ירושלים", "תל אביב"]);
    }

    #[test]
    fn test_shared_snapshot_replaces_contents() {
        let shared = SharedShelters::new();
        assert!(shared.snapshot().refreshed_at.is_none());
        shared.replace(ShelterLoad {
            shelters: demo_shelters(),
            failure: None,
        });
        let snapshot = shared.snapshot();
        assert_eq!(snapshot.shelters.len(), 2);
        assert!(snapshot.refreshed_at.is_some());
    }
}
