use super::profile::StyleProfile;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Process-wide holder of the current profile.
///
/// Readers pin an `Arc<StyleProfile>` for the length of a request and never
/// block; the learning adapter publishes successors with [`ProfileHandle::publish`].
pub struct ProfileHandle {
    inner: Arc<ArcSwap<StyleProfile>>,
}

impl ProfileHandle {
    pub fn new(profile: StyleProfile) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(profile)),
        }
    }

    /// Pin the current snapshot. Lock-free.
    pub fn snapshot(&self) -> Arc<StyleProfile> {
        self.inner.load_full()
    }

    pub fn version(&self) -> u64 {
        self.inner.load().version
    }

    /// Swap in a successor. Only the learning adapter calls this, after the
    /// successor has been persisted.
    pub(crate) fn publish(&self, profile: StyleProfile) {
        let version = profile.version;
        self.inner.store(Arc::new(profile));
        tracing::debug!(version, "style profile published");
    }
}

impl Clone for ProfileHandle {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
