use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::domain::{
    Badge, Identity, NewPiece, NewProfile, Piece, PieceId, PiecePatch, Profile, ProfileId,
    ProfilePatch,
};

use crate::{error::StoreError, remote::RemoteStore};

/// Every call that would change remote state, in arrival order. Failed calls
/// are recorded too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Write {
    InsertProfile { handle: String },
    UpdateProfile,
    InsertPiece { position: u32 },
    UpdatePiece { id: PieceId, patch: PiecePatch },
    RemovePiece { id: PieceId },
}

#[derive(Default)]
struct FakeState {
    profiles: Vec<Profile>,
    pieces: Vec<Piece>,
    writes: Vec<Write>,
    piece_updates: usize,
    fail_piece_update_at: Option<usize>,
    fail_fetch: bool,
    raced_profile: Option<Profile>,
    tick: i64,
}

impl FakeState {
    fn now(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        DateTime::from_timestamp(1_700_000_000 + self.tick, 0).expect("timestamp")
    }
}

/// In-memory [`RemoteStore`] with scripted failures.
pub(crate) struct FakeStore {
    identity: Option<Identity>,
    state: Mutex<FakeState>,
}

impl FakeStore {
    pub(crate) fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub(crate) fn signed_out() -> Self {
        Self {
            identity: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// The `n`th piece update (1-based) fails with a remote error.
    pub(crate) fn fail_piece_update_at(&self, n: usize) {
        self.state.lock().expect("lock").fail_piece_update_at = Some(n);
    }

    pub(crate) fn fail_fetches(&self, fail: bool) {
        self.state.lock().expect("lock").fail_fetch = fail;
    }

    /// `profile` appears just before the next profile insert, as if another
    /// session created it first.
    pub(crate) fn race_profile_insert(&self, profile: Profile) {
        self.state.lock().expect("lock").raced_profile = Some(profile);
    }

    pub(crate) fn seed_profile(&self, id: ProfileId, handle: &str) -> Profile {
        let mut state = self.state.lock().expect("lock");
        let now = state.now();
        let profile = Profile {
            id,
            handle: handle.to_string(),
            display_name: handle.to_string(),
            bio: String::new(),
            avatar_url: String::new(),
            theme: Default::default(),
            created_at: now,
            updated_at: now,
        };
        state.profiles.push(profile.clone());
        profile
    }

    pub(crate) fn seed_piece(&self, owner: ProfileId, title: &str, position: u32) -> Piece {
        let mut state = self.state.lock().expect("lock");
        let now = state.now();
        let piece = Piece {
            id: PieceId::new_v4(),
            profile_id: owner,
            image_url: format!("https://cdn.example/{title}.png"),
            destination_url: format!("https://example.com/{title}"),
            title: Some(title.to_string()),
            badge: Badge::None,
            position,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.pieces.push(piece.clone());
        piece
    }

    pub(crate) fn writes(&self) -> Vec<Write> {
        self.state.lock().expect("lock").writes.clone()
    }

    pub(crate) fn stored_pieces(&self) -> Vec<Piece> {
        let mut pieces = self.state.lock().expect("lock").pieces.clone();
        pieces.sort_by_key(|piece| piece.position);
        pieces
    }

    pub(crate) fn stored_profiles(&self) -> Vec<Profile> {
        self.state.lock().expect("lock").profiles.clone()
    }

    fn owner(&self) -> Result<ProfileId, StoreError> {
        self.identity
            .as_ref()
            .map(|identity| identity.id)
            .ok_or(StoreError::Unauthorized)
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError> {
        Ok(self.identity.clone())
    }

    async fn fetch_profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError> {
        let state = self.state.lock().expect("lock");
        if state.fail_fetch {
            return Err(StoreError::Remote("fetch failed".to_string()));
        }
        Ok(state.profiles.iter().find(|profile| profile.id == id).cloned())
    }

    async fn fetch_pieces(&self, owner: ProfileId) -> Result<Vec<Piece>, StoreError> {
        let state = self.state.lock().expect("lock");
        if state.fail_fetch {
            return Err(StoreError::Remote("fetch failed".to_string()));
        }
        let mut pieces: Vec<Piece> = state
            .pieces
            .iter()
            .filter(|piece| piece.profile_id == owner)
            .cloned()
            .collect();
        pieces.sort_by_key(|piece| piece.position);
        Ok(pieces)
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        let mut state = self.state.lock().expect("lock");
        state.writes.push(Write::InsertProfile {
            handle: profile.handle.clone(),
        });
        if let Some(raced) = state.raced_profile.take() {
            state.profiles.push(raced);
        }
        if state
            .profiles
            .iter()
            .any(|existing| existing.id == profile.id || existing.handle == profile.handle)
        {
            return Err(StoreError::Conflict("profile or handle already exists".to_string()));
        }

        let now = state.now();
        let created = Profile {
            id: profile.id,
            handle: profile.handle,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            theme: profile.theme,
            created_at: now,
            updated_at: now,
        };
        state.profiles.push(created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: ProfileId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError> {
        let mut state = self.state.lock().expect("lock");
        state.writes.push(Write::UpdateProfile);
        let now = state.now();
        let profile = state
            .profiles
            .iter_mut()
            .find(|profile| profile.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(display_name) = patch.display_name {
            profile.display_name = display_name;
        }
        if let Some(bio) = patch.bio {
            profile.bio = bio;
        }
        if let Some(avatar_url) = patch.avatar_url {
            profile.avatar_url = avatar_url;
        }
        if let Some(theme) = patch.theme {
            profile.theme = theme;
        }
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn insert_piece(
        &self,
        owner: ProfileId,
        piece: NewPiece,
        position: u32,
    ) -> Result<Piece, StoreError> {
        self.owner()?;
        let mut state = self.state.lock().expect("lock");
        state.writes.push(Write::InsertPiece { position });
        let now = state.now();
        let created = Piece {
            id: PieceId::new_v4(),
            profile_id: owner,
            image_url: piece.image_url,
            destination_url: piece.destination_url,
            title: piece.title,
            badge: piece.badge,
            position,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.pieces.push(created.clone());
        Ok(created)
    }

    async fn update_piece(&self, id: PieceId, patch: PiecePatch) -> Result<Piece, StoreError> {
        let owner = self.owner()?;
        let mut state = self.state.lock().expect("lock");
        state.writes.push(Write::UpdatePiece {
            id,
            patch: patch.clone(),
        });
        state.piece_updates += 1;
        if state.fail_piece_update_at == Some(state.piece_updates) {
            return Err(StoreError::Remote("write rejected".to_string()));
        }

        let now = state.now();
        let piece = state
            .pieces
            .iter_mut()
            .find(|piece| piece.id == id && piece.profile_id == owner)
            .ok_or(StoreError::NotFound)?;
        if let Some(image_url) = patch.image_url {
            piece.image_url = image_url;
        }
        if let Some(destination_url) = patch.destination_url {
            piece.destination_url = destination_url;
        }
        if let Some(title) = patch.title {
            piece.title = (!title.is_empty()).then_some(title);
        }
        if let Some(badge) = patch.badge {
            piece.badge = badge;
        }
        if let Some(position) = patch.position {
            piece.position = position;
        }
        if let Some(is_active) = patch.is_active {
            piece.is_active = is_active;
        }
        piece.updated_at = now;
        Ok(piece.clone())
    }

    async fn remove_piece(&self, id: PieceId) -> Result<(), StoreError> {
        let owner = self.owner()?;
        let mut state = self.state.lock().expect("lock");
        state.writes.push(Write::RemovePiece { id });
        let before = state.pieces.len();
        state
            .pieces
            .retain(|piece| !(piece.id == id && piece.profile_id == owner));
        if state.pieces.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
