use thiserror::Error;
use url::Url;

use crate::{
    domain::{Badge, NewPiece, NewProfile, PiecePatch, ProfilePatch},
    error::{ApiError, ErrorCode},
};

pub const HANDLE_MIN_CHARS: usize = 3;
pub const HANDLE_MAX_CHARS: usize = 30;
pub const DISPLAY_NAME_MAX_CHARS: usize = 50;
pub const BIO_MAX_CHARS: usize = 160;
pub const TITLE_MAX_CHARS: usize = 60;
pub const BADGE_TEXT_MAX_CHARS: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("handle must be between {HANDLE_MIN_CHARS} and {HANDLE_MAX_CHARS} characters")]
    HandleLength,
    #[error(
        "handle may only contain lowercase letters, digits and hyphens, and cannot start or end with a hyphen"
    )]
    HandleFormat,
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("{field} must be a valid URL")]
    InvalidUrl { field: &'static str },
    #[error("{field} must start with http:// or https://")]
    UnsupportedScheme { field: &'static str },
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::new(ErrorCode::Validation, value.to_string())
    }
}

pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    let len = handle.chars().count();
    if !(HANDLE_MIN_CHARS..=HANDLE_MAX_CHARS).contains(&len) {
        return Err(ValidationError::HandleLength);
    }
    let allowed = handle
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !allowed || handle.starts_with('-') || handle.ends_with('-') {
        return Err(ValidationError::HandleFormat);
    }
    Ok(())
}

/// Folds arbitrary text (an email local part, a typed name) into a valid
/// handle, or `None` when too little of it survives.
pub fn slugify_handle(raw: &str) -> Option<String> {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let mut slug: String = slug.chars().take(HANDLE_MAX_CHARS).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    validate_handle(&slug).ok().map(|()| slug)
}

pub fn validate_new_profile(profile: &NewProfile) -> Result<(), ValidationError> {
    validate_handle(&profile.handle)?;
    validate_display_name(&profile.display_name)?;
    validate_bio(&profile.bio)?;
    validate_avatar_url(&profile.avatar_url)
}

pub fn validate_profile_patch(patch: &ProfilePatch) -> Result<(), ValidationError> {
    if let Some(display_name) = &patch.display_name {
        validate_display_name(display_name)?;
    }
    if let Some(bio) = &patch.bio {
        validate_bio(bio)?;
    }
    if let Some(avatar_url) = &patch.avatar_url {
        validate_avatar_url(avatar_url)?;
    }
    Ok(())
}

pub fn validate_new_piece(piece: &NewPiece) -> Result<(), ValidationError> {
    validate_image_url(&piece.image_url)?;
    validate_destination_url(&piece.destination_url)?;
    if let Some(title) = &piece.title {
        validate_title(title)?;
    }
    validate_badge(&piece.badge)
}

pub fn validate_piece_patch(patch: &PiecePatch) -> Result<(), ValidationError> {
    if let Some(image_url) = &patch.image_url {
        validate_image_url(image_url)?;
    }
    if let Some(destination_url) = &patch.destination_url {
        validate_destination_url(destination_url)?;
    }
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    if let Some(badge) = &patch.badge {
        validate_badge(badge)?;
    }
    Ok(())
}

fn validate_display_name(display_name: &str) -> Result<(), ValidationError> {
    check_length("display_name", display_name, 1, DISPLAY_NAME_MAX_CHARS)
}

fn validate_bio(bio: &str) -> Result<(), ValidationError> {
    check_length("bio", bio, 0, BIO_MAX_CHARS)
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    check_length("title", title, 0, TITLE_MAX_CHARS)
}

fn validate_badge(badge: &Badge) -> Result<(), ValidationError> {
    match badge {
        Badge::Custom { text, .. } => check_length("badge_text", text, 0, BADGE_TEXT_MAX_CHARS),
        Badge::None | Badge::Preset(_) => Ok(()),
    }
}

fn validate_avatar_url(avatar_url: &str) -> Result<(), ValidationError> {
    if avatar_url.is_empty() {
        return Ok(());
    }
    parse_url("avatar_url", avatar_url).map(drop)
}

fn validate_image_url(image_url: &str) -> Result<(), ValidationError> {
    parse_url("image_url", image_url).map(drop)
}

fn validate_destination_url(destination_url: &str) -> Result<(), ValidationError> {
    let url = parse_url("destination_url", destination_url)?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::UnsupportedScheme {
            field: "destination_url",
        }),
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ValidationError> {
    Url::parse(raw).map_err(|_| ValidationError::InvalidUrl { field })
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::Length { field, min, max })
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
