//! Profile persistence for onboarding results.
//!
//! Defines the `ProfileStore` trait that all profile backends must implement.
//! Provides a `MemoryStore` for testing, a `ProfileClient` for the backend API
//! and a `CachedProfileStore` wrapper whose views are dropped on invalidation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use safe_types::{Address, Result};

pub mod cached;
pub mod memory;
pub mod profile_client;

pub use cached::CachedProfileStore;
pub use memory::MemoryStore;
pub use profile_client::ProfileClient;

/// Views derived from the user profile that must be refreshed after it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileView {
    /// The list of Safes linked to the user.
    UserSafes,
    /// Onboarding progress (including the primary Safe).
    OnboardingStatus,
}

impl ProfileView {
    pub const ALL: [ProfileView; 2] = [ProfileView::UserSafes, ProfileView::OnboardingStatus];
}

/// Onboarding state as stored in the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    #[serde(default)]
    pub primary_safe_address: Option<Address>,
    #[serde(default)]
    pub has_completed_onboarding: bool,
}

/// The core profile store trait.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Record the user's primary Safe and mark onboarding complete.
    async fn complete_onboarding(&self, primary_safe_address: &Address) -> Result<()>;

    async fn onboarding_status(&self) -> Result<OnboardingStatus>;

    /// Drop any cached copy of `view`.
    async fn invalidate(&self, _view: ProfileView) -> Result<()> {
        Ok(())
    }
}
