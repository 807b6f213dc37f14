use async_trait::async_trait;
use shared::domain::{
    Identity, NewPiece, NewProfile, Piece, PieceId, PiecePatch, Profile, ProfileId, ProfilePatch,
};

use crate::error::StoreError;

/// An id belonging to somebody else reads as [`StoreError::NotFound`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError>;

    async fn fetch_profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError>;

    async fn fetch_pieces(&self, owner: ProfileId) -> Result<Vec<Piece>, StoreError>;

    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError>;

    async fn update_profile(
        &self,
        id: ProfileId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError>;

    async fn insert_piece(
        &self,
        owner: ProfileId,
        piece: NewPiece,
        position: u32,
    ) -> Result<Piece, StoreError>;

    async fn update_piece(&self, id: PieceId, patch: PiecePatch) -> Result<Piece, StoreError>;

    async fn remove_piece(&self, id: PieceId) -> Result<(), StoreError>;
}

pub(crate) async fn require_identity(store: &dyn RemoteStore) -> Result<Identity, StoreError> {
    store
        .current_identity()
        .await?
        .ok_or(StoreError::Unauthorized)
}
