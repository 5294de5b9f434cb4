//! In-memory profile store for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::*;
use safe_types::{Address, Result};

/// In-memory profile store (for testing and ephemeral use).
pub struct MemoryStore {
    status: Mutex<OnboardingStatus>,
    completions: Mutex<Vec<Address>>,
    invalidations: Mutex<Vec<ProfileView>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(OnboardingStatus::default()),
            completions: Mutex::new(Vec::new()),
            invalidations: Mutex::new(Vec::new()),
        }
    }

    /// Every address passed to `complete_onboarding`, in call order.
    pub fn completions(&self) -> Vec<Address> {
        self.completions.lock().unwrap().clone()
    }

    /// Every invalidated view, in call order.
    pub fn invalidations(&self) -> Vec<ProfileView> {
        self.invalidations.lock().unwrap().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn complete_onboarding(&self, primary_safe_address: &Address) -> Result<()> {
        let mut status = self.status.lock().unwrap();
        status.primary_safe_address = Some(*primary_safe_address);
        status.has_completed_onboarding = true;
        self.completions.lock().unwrap().push(*primary_safe_address);
        Ok(())
    }

    async fn onboarding_status(&self) -> Result<OnboardingStatus> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn invalidate(&self, view: ProfileView) -> Result<()> {
        self.invalidations.lock().unwrap().push(view);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safe_types::address;

    #[tokio::test]
    async fn test_complete_onboarding_records_address() {
        let store = MemoryStore::new();
        assert_eq!(store.onboarding_status().await.unwrap(), OnboardingStatus::default());

        let safe = address!("5afe5afe5afe5afe5afe5afe5afe5afe5afe5afe");
        store.complete_onboarding(&safe).await.unwrap();
        store.invalidate(ProfileView::UserSafes).await.unwrap();

        let status = store.onboarding_status().await.unwrap();
        assert_eq!(status.primary_safe_address, Some(safe));
        assert!(status.has_completed_onboarding);
        assert_eq!(store.completions(), vec![safe]);
        assert_eq!(store.invalidations(), vec![ProfileView::UserSafes]);
    }
}
