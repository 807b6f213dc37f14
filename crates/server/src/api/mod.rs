use shared::{
    domain::{NewProfile, Piece, PieceId, PiecePatch, Profile, ProfileId, ProfilePatch},
    error::ApiError,
    protocol::{CreatePieceRequest, HandleAvailability, PublicProfile},
    validation::{
        validate_handle, validate_new_piece, validate_new_profile, validate_piece_patch,
        validate_profile_patch,
    },
};
use storage::{is_unique_violation, Storage};
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn current_profile(ctx: &ApiContext, user_id: ProfileId) -> Result<Profile, ApiError> {
    ctx.storage
        .load_profile(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("profile not found"))
}

pub async fn create_profile(
    ctx: &ApiContext,
    user_id: ProfileId,
    profile: NewProfile,
) -> Result<Profile, ApiError> {
    if profile.id != user_id {
        return Err(ApiError::forbidden(
            "a profile can only be created for the calling identity",
        ));
    }
    validate_new_profile(&profile)?;

    let created = ctx
        .storage
        .insert_profile(&profile)
        .await
        .map_err(storage_write)?;
    info!(profile_id = %created.id, handle = %created.handle, "profile created");
    Ok(created)
}

pub async fn update_profile(
    ctx: &ApiContext,
    user_id: ProfileId,
    patch: ProfilePatch,
) -> Result<Profile, ApiError> {
    validate_profile_patch(&patch)?;
    ctx.storage
        .update_profile(user_id, &patch)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("profile not found"))
}

pub async fn handle_availability(
    ctx: &ApiContext,
    handle: &str,
) -> Result<HandleAvailability, ApiError> {
    validate_handle(handle)?;
    let taken = ctx.storage.handle_exists(handle).await.map_err(internal)?;
    Ok(HandleAvailability {
        handle: handle.to_string(),
        available: !taken,
    })
}

pub async fn list_pieces(ctx: &ApiContext, user_id: ProfileId) -> Result<Vec<Piece>, ApiError> {
    ctx.storage.list_pieces(user_id).await.map_err(internal)
}

pub async fn create_piece(
    ctx: &ApiContext,
    user_id: ProfileId,
    request: CreatePieceRequest,
) -> Result<Piece, ApiError> {
    validate_new_piece(&request.piece)?;
    current_profile(ctx, user_id).await?;

    let piece = ctx
        .storage
        .insert_piece(user_id, &request.piece, request.position)
        .await
        .map_err(internal)?;
    info!(
        profile_id = %user_id,
        piece_id = %piece.id,
        position = piece.position,
        "piece created"
    );
    Ok(piece)
}

pub async fn update_piece(
    ctx: &ApiContext,
    user_id: ProfileId,
    piece_id: PieceId,
    patch: PiecePatch,
) -> Result<Piece, ApiError> {
    validate_piece_patch(&patch)?;
    ctx.storage
        .update_piece(user_id, piece_id, &patch)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("piece not found"))
}

pub async fn delete_piece(
    ctx: &ApiContext,
    user_id: ProfileId,
    piece_id: PieceId,
) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_piece(user_id, piece_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found("piece not found"));
    }
    info!(profile_id = %user_id, %piece_id, "piece deleted");
    Ok(())
}

pub async fn public_profile(ctx: &ApiContext, handle: &str) -> Result<PublicProfile, ApiError> {
    let profile = ctx
        .storage
        .load_profile_by_handle(handle)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let pieces = ctx
        .storage
        .list_active_pieces(profile.id)
        .await
        .map_err(internal)?;
    Ok(PublicProfile::build(&profile, &pieces))
}

fn storage_write(err: anyhow::Error) -> ApiError {
    if is_unique_violation(&err) {
        return ApiError::conflict("profile or handle already exists");
    }
    internal(err)
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "storage failure");
    ApiError::internal(err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
