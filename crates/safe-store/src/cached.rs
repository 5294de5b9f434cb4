//! Read-through cache over another profile store.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use safe_types::{Address, Result};

use crate::{OnboardingStatus, ProfileStore, ProfileView};

/// Caches `onboarding_status` until the view is invalidated.
pub struct CachedProfileStore {
    inner: Arc<dyn ProfileStore>,
    status: RwLock<Option<OnboardingStatus>>,
}

impl CachedProfileStore {
    pub fn new(inner: Arc<dyn ProfileStore>) -> Self {
        Self {
            inner,
            status: RwLock::new(None),
        }
    }

    pub async fn is_cached(&self) -> bool {
        self.status.read().await.is_some()
    }
}

#[async_trait]
impl ProfileStore for CachedProfileStore {
    async fn complete_onboarding(&self, primary_safe_address: &Address) -> Result<()> {
        self.inner.complete_onboarding(primary_safe_address).await
    }

    async fn onboarding_status(&self) -> Result<OnboardingStatus> {
        if let Some(status) = self.status.read().await.as_ref() {
            return Ok(status.clone());
        }
        let fresh = self.inner.onboarding_status().await?;
        *self.status.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    async fn invalidate(&self, view: ProfileView) -> Result<()> {
        if view == ProfileView::OnboardingStatus {
            debug!("dropping cached onboarding status");
            *self.status.write().await = None;
        }
        self.inner.invalidate(view).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safe_types::address;
    use crate::MemoryStore;

    #[tokio::test]
    async fn test_cache_refreshes_after_invalidation() {
        let inner = Arc::new(MemoryStore::new());
        let cached = CachedProfileStore::new(inner.clone());

        assert!(cached.onboarding_status().await.unwrap().primary_safe_address.is_none());
        assert!(cached.is_cached().await);

        let safe = address!("5afe5afe5afe5afe5afe5afe5afe5afe5afe5afe");
        cached.complete_onboarding(&safe).await.unwrap();
        // Stale until invalidated.
        assert!(cached.onboarding_status().await.unwrap().primary_safe_address.is_none());

        cached.invalidate(ProfileView::UserSafes).await.unwrap();
        assert!(cached.is_cached().await);

        cached.invalidate(ProfileView::OnboardingStatus).await.unwrap();
        assert!(!cached.is_cached().await);
        assert_eq!(
            cached.onboarding_status().await.unwrap().primary_safe_address,
            Some(safe)
        );
        assert_eq!(
            inner.invalidations(),
            vec![ProfileView::UserSafes, ProfileView::OnboardingStatus]
        );
    }
}
