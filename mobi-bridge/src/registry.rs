//! Slug registry: in-memory mapping from short public identifiers to
//! converted artifacts on disk.
//!
//! The registry is constructed once at startup and shared (via `Arc`) by the
//! conversion pipeline and the retrieval service. Writers are serialized
//! against each other and against readers with a reader/writer lock; readers
//! proceed concurrently.
//!
//! Entries are never expired. A slug collision overwrites the previous entry
//! (last writer wins); the overwrite is reported to the caller and logged.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::RwLock;
use rand_core::{OsRng, RngCore};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Number of random bytes drawn per slug.
const SLUG_ENTROPY_BYTES: usize = 3;

/// Length of a rendered slug in characters.
pub const SLUG_LEN: usize = 3;

/// Source of fresh slugs.
pub trait SlugGenerator: Send + Sync {
    /// Produce a new slug, or fail if no randomness is available.
    fn generate(&self) -> Result<String>;
}

/// Slug generator backed by the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSlugGenerator;

impl SlugGenerator for OsSlugGenerator {
    fn generate(&self) -> Result<String> {
        let mut bytes = [0u8; SLUG_ENTROPY_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::EntropySource(e.to_string()))?;
        Ok(encode_slug(&bytes))
    }
}

/// Render random bytes as a URL-safe slug of [`SLUG_LEN`] characters.
pub fn encode_slug(bytes: &[u8]) -> String {
    let mut encoded = URL_SAFE_NO_PAD.encode(bytes);
    encoded.truncate(SLUG_LEN);
    encoded
}

/// Concurrent slug → path map.
pub struct SlugRegistry {
    files: RwLock<HashMap<String, PathBuf>>,
    generator: Arc<dyn SlugGenerator>,
}

impl SlugRegistry {
    /// Create an empty registry drawing slugs from OS entropy.
    pub fn new() -> Self {
        Self::with_generator(Arc::new(OsSlugGenerator))
    }

    /// Create an empty registry with a custom slug source.
    pub fn with_generator(generator: Arc<dyn SlugGenerator>) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            generator,
        }
    }

    /// Generate a fresh slug. Does not reserve it.
    pub fn generate(&self) -> Result<String> {
        self.generator.generate()
    }

    /// Insert or overwrite a mapping, returning the path it replaced.
    pub fn insert(&self, slug: impl Into<String>, path: impl Into<PathBuf>) -> Option<PathBuf> {
        let slug = slug.into();
        let path = path.into();
        debug!(slug = %slug, path = %path.display(), "Registering artifact");

        let previous = self.files.write().insert(slug.clone(), path);
        if let Some(ref old) = previous {
            warn!(
                slug = %slug,
                replaced = %old.display(),
                "Slug collision, previous artifact is no longer reachable"
            );
        }
        previous
    }

    /// Resolve a slug to its artifact path.
    pub fn lookup(&self, slug: &str) -> Result<PathBuf> {
        self.files
            .read()
            .get(slug)
            .cloned()
            .ok_or_else(|| Error::not_found(slug))
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl Default for SlugRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_insert_then_lookup() {
        let registry = SlugRegistry::new();
        assert!(registry.insert("aB1", "/uploads/book.mobi").is_none());
        assert_eq!(
            registry.lookup("aB1").unwrap(),
            PathBuf::from("/uploads/book.mobi")
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_unknown_slug() {
        let registry = SlugRegistry::new();
        registry.insert("aB1", "/uploads/book.mobi");

        let err = registry.lookup("zzz").unwrap_err();
        assert!(err.is_not_found());
        assert!(registry.lookup("").unwrap_err().is_not_found());
    }

    #[test]
    fn test_last_writer_wins() {
        let registry = SlugRegistry::new();
        registry.insert("aB1", "first.mobi");
        let replaced = registry.insert("aB1", "second.mobi");

        assert_eq!(replaced, Some(PathBuf::from("first.mobi")));
        assert_eq!(registry.lookup("aB1").unwrap(), PathBuf::from("second.mobi"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_inserts_are_not_lost() {
        const WRITERS: usize = 64;
        let registry = Arc::new(SlugRegistry::new());

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    registry.insert(format!("s{i}"), format!("/uploads/{i}.mobi"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), WRITERS);
        for i in 0..WRITERS {
            assert_eq!(
                registry.lookup(&format!("s{i}")).unwrap(),
                PathBuf::from(format!("/uploads/{i}.mobi"))
            );
        }
    }

    #[test]
    fn test_readers_alongside_writers() {
        let registry = Arc::new(SlugRegistry::new());
        registry.insert("fix", "/uploads/fixed.mobi");

        let mut handles = Vec::new();
        for i in 0..16 {
            let writer = registry.clone();
            handles.push(thread::spawn(move || {
                writer.insert(format!("w{i}"), format!("/uploads/w{i}.mobi"));
            }));
            let reader = registry.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(
                        reader.lookup("fix").unwrap(),
                        PathBuf::from("/uploads/fixed.mobi")
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 17);
    }

    #[test]
    fn test_encode_slug() {
        assert_eq!(encode_slug(&[0, 0, 0]), "AAA");
        assert_eq!(encode_slug(&[0xff, 0xff, 0xff]), "___");
        assert_eq!(encode_slug(&[0xfb, 0xef, 0xbe]).len(), SLUG_LEN);
    }

    #[test]
    fn test_os_generator_produces_url_safe_slugs() {
        let generator = OsSlugGenerator;
        for _ in 0..100 {
            let slug = generator.generate().unwrap();
            assert_eq!(slug.len(), SLUG_LEN);
            assert!(
                slug.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "unexpected slug {slug}"
            );
        }
    }

    #[test]
    fn test_custom_generator() {
        struct Fixed;
        impl SlugGenerator for Fixed {
            fn generate(&self) -> Result<String> {
                Ok("aB1".to_string())
            }
        }

        let registry = SlugRegistry::with_generator(Arc::new(Fixed));
        assert_eq!(registry.generate().unwrap(), "aB1");
        assert!(registry.is_empty());
    }
}
