use std::sync::Arc;

use shared::{
    domain::{Identity, NewProfile, Profile, ProfileId, ProfilePatch, Theme},
    validation::{slugify_handle, validate_handle, DISPLAY_NAME_MAX_CHARS},
};
use tracing::{info, warn};

use crate::{
    error::{ClientError, StoreError},
    remote::{require_identity, RemoteStore},
    state::LoadState,
};

/// The signed-in user's profile, created with defaults on first load.
pub struct ProfileController {
    store: Arc<dyn RemoteStore>,
    profile: Option<Profile>,
    phase: LoadState,
    error: Option<ClientError>,
}

impl ProfileController {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            profile: None,
            phase: LoadState::Uninitialized,
            error: None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn phase(&self) -> LoadState {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    /// Fetches the caller's profile, creating it from [`default_profile`]
    /// when the store has none.
    pub async fn load(&mut self) -> Result<&Profile, ClientError> {
        self.phase = LoadState::Loading;
        match self.fetch_or_create().await {
            Ok(profile) => {
                self.phase = LoadState::Ready;
                self.error = None;
                Ok(self.profile.insert(profile))
            }
            Err(source) => {
                warn!(error = %source, "failed to load profile");
                let err = ClientError::Fetch {
                    what: "profile",
                    source,
                };
                self.profile = None;
                self.phase = LoadState::Errored;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn fetch_or_create(&self) -> Result<Profile, StoreError> {
        let identity = require_identity(self.store.as_ref()).await?;
        if let Some(profile) = self.store.fetch_profile(identity.id).await? {
            return Ok(profile);
        }

        let defaults = default_profile(&identity);
        match self.store.insert_profile(defaults.clone()).await {
            Ok(profile) => {
                info!(profile_id = %profile.id, handle = %profile.handle, "profile created with defaults");
                Ok(profile)
            }
            Err(StoreError::Conflict(reason)) => {
                warn!(profile_id = %identity.id, %reason, "profile insert conflicted");
                if let Some(profile) = self.store.fetch_profile(identity.id).await? {
                    return Ok(profile);
                }

                // The id is free, so the handle was taken.
                let handle = id_handle(identity.id);
                if handle == defaults.handle {
                    return Err(StoreError::Conflict(reason));
                }
                let profile = self
                    .store
                    .insert_profile(NewProfile { handle, ..defaults })
                    .await?;
                info!(profile_id = %profile.id, handle = %profile.handle, "profile created with id handle");
                Ok(profile)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn update(&mut self, patch: ProfilePatch) -> Result<&Profile, ClientError> {
        let Some(id) = self.profile.as_ref().map(|profile| profile.id) else {
            self.error = Some(ClientError::NoProfile);
            return Err(ClientError::NoProfile);
        };

        match self.store.update_profile(id, patch).await {
            Ok(profile) => {
                self.error = None;
                Ok(self.profile.insert(profile))
            }
            Err(err) => {
                let err = ClientError::from(err);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }
}

/// Defaults for a fresh identity: the sign-up handle if it is valid, else one
/// derived from the email, else one derived from the id. The display name
/// falls back to the handle.
pub fn default_profile(identity: &Identity) -> NewProfile {
    let handle = identity
        .handle
        .as_deref()
        .map(str::trim)
        .filter(|handle| validate_handle(handle).is_ok())
        .map(str::to_string)
        .or_else(|| {
            identity
                .email
                .as_deref()
                .and_then(|email| email.split('@').next())
                .and_then(slugify_handle)
        })
        .unwrap_or_else(|| id_handle(identity.id));

    let display_name = identity
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.chars().take(DISPLAY_NAME_MAX_CHARS).collect())
        .unwrap_or_else(|| handle.clone());

    NewProfile {
        id: identity.id,
        handle,
        display_name,
        bio: String::new(),
        avatar_url: String::new(),
        theme: Theme::Clean,
    }
}

pub fn id_handle(id: ProfileId) -> String {
    let simple = id.0.simple().to_string();
    format!("user-{}", &simple[..8])
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
