use std::sync::Arc;

use shared::domain::{NewPiece, Piece, PieceId, PiecePatch};
use tracing::{error, info, warn};

use crate::{
    error::{ClientError, StoreError},
    remote::{require_identity, RemoteStore},
    state::LoadState,
};

/// Local view of the signed-in user's pieces, kept in display order.
pub struct PieceCollection {
    store: Arc<dyn RemoteStore>,
    pieces: Vec<Piece>,
    phase: LoadState,
    error: Option<ClientError>,
}

impl PieceCollection {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            pieces: Vec::new(),
            phase: LoadState::Uninitialized,
            error: None,
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn active_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|piece| piece.is_active)
    }

    pub fn get(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|piece| piece.id == id)
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

    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.phase = LoadState::Loading;
        match self.fetch_ordered().await {
            Ok(pieces) => {
                info!(count = pieces.len(), "pieces loaded");
                self.pieces = pieces;
                self.phase = LoadState::Ready;
                self.error = None;
                Ok(())
            }
            Err(source) => {
                warn!(error = %source, "failed to load pieces");
                self.pieces.clear();
                self.phase = LoadState::Errored;
                Err(self.fail(ClientError::Fetch {
                    what: "pieces",
                    source,
                }))
            }
        }
    }

    async fn fetch_ordered(&self) -> Result<Vec<Piece>, StoreError> {
        let identity = require_identity(self.store.as_ref()).await?;
        let mut pieces = self.store.fetch_pieces(identity.id).await?;
        pieces.sort_by_key(|piece| piece.position);
        Ok(pieces)
    }

    pub async fn create(&mut self, input: NewPiece) -> Result<Piece, ClientError> {
        let position = position_of(self.pieces.len());
        let result = async {
            let identity = require_identity(self.store.as_ref()).await?;
            self.store.insert_piece(identity.id, input, position).await
        }
        .await;

        match result {
            Ok(piece) => {
                info!(piece_id = %piece.id, position = piece.position, "piece created");
                self.pieces.push(piece.clone());
                self.error = None;
                Ok(piece)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub async fn update(&mut self, id: PieceId, patch: PiecePatch) -> Result<Piece, ClientError> {
        match self.store.update_piece(id, patch).await {
            Ok(piece) => {
                if let Some(slot) = self.pieces.iter_mut().find(|slot| slot.id == id) {
                    *slot = piece.clone();
                }
                self.error = None;
                Ok(piece)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    // Remaining positions keep their gaps.
    pub async fn delete(&mut self, id: PieceId) -> Result<(), ClientError> {
        match self.store.remove_piece(id).await {
            Ok(()) => {
                info!(piece_id = %id, "piece deleted");
                self.pieces.retain(|piece| piece.id != id);
                self.error = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub async fn toggle_active(
        &mut self,
        id: PieceId,
        is_active: bool,
    ) -> Result<Piece, ClientError> {
        self.update(id, PiecePatch::active(is_active)).await
    }

    /// Makes `sequence` the collection order: [`PieceCollection::apply_order`]
    /// followed by [`PieceCollection::confirm_order`].
    pub async fn reorder(&mut self, sequence: Vec<Piece>) -> Result<(), ClientError> {
        let order = self.apply_order(sequence);
        self.confirm_order(&order).await
    }

    pub async fn move_piece(&mut self, from: usize, to: usize) -> Result<(), ClientError> {
        let len = self.pieces.len();
        if from >= len || to >= len {
            return Err(self.fail(ClientError::InvalidMove { from, to, len }));
        }
        if from == to {
            return Ok(());
        }

        let mut sequence = self.pieces.clone();
        let piece = sequence.remove(from);
        sequence.insert(to, piece);
        self.reorder(sequence).await
    }

    /// Shows `sequence` locally with positions `0..n` without touching the
    /// store. Returns the ids in their new order.
    pub fn apply_order(&mut self, sequence: Vec<Piece>) -> Vec<PieceId> {
        self.pieces = sequence
            .into_iter()
            .enumerate()
            .map(|(index, mut piece)| {
                piece.position = position_of(index);
                piece
            })
            .collect();
        info!(count = self.pieces.len(), "pieces reordered locally");
        self.pieces.iter().map(|piece| piece.id).collect()
    }

    /// Writes position `i` for `order[i]`, one at a time. The first failure
    /// stops the rest, reloads from the store and is returned.
    pub async fn confirm_order(&mut self, order: &[PieceId]) -> Result<(), ClientError> {
        match self.write_positions(order).await {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "position write failed; resyncing pieces");
                if let Err(resync) = self.load().await {
                    error!(error = %resync, "resync after failed reorder failed");
                }
                Err(self.fail(err))
            }
        }
    }

    async fn write_positions(&mut self, order: &[PieceId]) -> Result<(), ClientError> {
        for (index, id) in order.iter().enumerate() {
            let saved = self
                .store
                .update_piece(*id, PiecePatch::position(position_of(index)))
                .await?;
            if let Some(slot) = self.pieces.iter_mut().find(|slot| slot.id == saved.id) {
                *slot = saved;
            }
        }
        Ok(())
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.error = Some(err.clone());
        err
    }
}

fn position_of(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "tests/pieces_tests.rs"]
mod tests;
