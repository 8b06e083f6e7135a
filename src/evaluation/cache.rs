use std::{collections::HashMap, sync::Arc};

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use tracing::trace;

use super::FulfillmentMap;
use crate::domain::{Course, Overrides};

/// Identifies one evaluation: a catalog version together with the course set
/// and override set it was evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    catalog: String,
    courses: String,
    overrides: String,
}

impl CacheKey {
    /// The key for evaluating catalog `version` against `courses` and
    /// `overrides`.
    #[must_use]
    pub fn new(version: &str, courses: &[Course], overrides: &Overrides) -> Self {
        Self {
            catalog: version.to_string(),
            courses: fingerprint_courses(courses),
            overrides: fingerprint_overrides(overrides),
        }
    }
}

/// Fingerprint a course set.
///
/// Evaluation does not depend on course order, so neither does the
/// fingerprint. Repeated courses are counted.
///
/// # Panics
///
/// Panics if borsh serialization fails (which should never happen for this
/// data structure).
#[must_use]
pub fn fingerprint_courses(courses: &[Course]) -> String {
    let mut ids: Vec<&str> = courses.iter().map(Course::id).collect();
    ids.sort_unstable();
    digest(&ids)
}

/// Fingerprint an override set.
///
/// # Panics
///
/// Panics if borsh serialization fails (which should never happen for this
/// data structure).
#[must_use]
pub fn fingerprint_overrides(overrides: &Overrides) -> String {
    let ids: Vec<&str> = overrides.iter().collect();
    digest(&ids)
}

fn digest(ids: &[&str]) -> String {
    #[derive(BorshSerialize)]
    struct FingerprintData<'a> {
        ids: &'a [&'a str],
    }

    let encoded = borsh::to_vec(&FingerprintData { ids }).expect("this should never fail");
    let hash = Sha256::digest(encoded);
    format!("{hash:x}")
}

/// Memoised evaluation results.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    entries: HashMap<CacheKey, Arc<FulfillmentMap>>,
    hits: usize,
    misses: usize,
}

impl EvaluationCache {
    /// Return the cached result for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: CacheKey, evaluate: F) -> Arc<FulfillmentMap>
    where
        F: FnOnce() -> FulfillmentMap,
    {
        if let Some(map) = self.entries.get(&key) {
            self.hits += 1;
            trace!(hits = self.hits, "evaluation cache hit");
            return Arc::clone(map);
        }
        self.misses += 1;
        trace!(misses = self.misses, "evaluation cache miss");
        let map = Arc::new(evaluate());
        self.entries.insert(key, Arc::clone(&map));
        map
    }

    /// The cached result for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<FulfillmentMap>> {
        self.entries.get(key).cloned()
    }

    /// Number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    pub const fn hits(&self) -> usize {
        self.hits
    }

    /// Number of lookups that required an evaluation.
    #[must_use]
    pub const fn misses(&self) -> usize {
        self.misses
    }

    /// Drop every cached result.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::requirement::tests::course;

    #[test]
    fn course_fingerprint_ignores_order() {
        let a = course("a", 4.0, &[]);
        let b = course("b", 4.0, &[]);

        assert_eq!(
            fingerprint_courses(&[a.clone(), b.clone()]),
            fingerprint_courses(&[b.clone(), a.clone()])
        );
        assert_ne!(
            fingerprint_courses(&[a.clone()]),
            fingerprint_courses(&[a.clone(), a])
        );
        assert_ne!(fingerprint_courses(&[b]), fingerprint_courses(&[]));
    }

    #[test]
    fn override_fingerprint_tracks_contents() {
        let empty = Overrides::new();
        let some: Overrides = ["x"].into_iter().collect();

        assert_ne!(fingerprint_overrides(&empty), fingerprint_overrides(&some));
        assert_eq!(fingerprint_overrides(&some).len(), 64);
    }

    #[test]
    fn keys_differ_by_catalog_version() {
        let overrides = Overrides::new();
        assert_ne!(
            CacheKey::new("v1", &[], &overrides),
            CacheKey::new("v2", &[], &overrides)
        );
    }

    #[test]
    fn computes_once_per_key() {
        let mut cache = EvaluationCache::default();
        let key = CacheKey::new("v1", &[], &Overrides::new());
        let mut calls = 0;

        for _ in 0..3 {
            cache.get_or_insert_with(key.clone(), || {
                calls += 1;
                FulfillmentMap::default()
            });
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!((cache.hits(), cache.misses()), (2, 1));
        assert!(cache.get(&key).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}
