use serde::{Deserialize, Serialize};

use crate::domain::{BadgeDisplay, NewPiece, Piece, PieceId, Profile, Theme};

pub const SITE_NAME: &str = "MOSAI";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePieceRequest {
    #[serde(flatten)]
    pub piece: NewPiece,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleAvailability {
    pub handle: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPiece {
    pub id: PieceId,
    pub image_url: String,
    pub destination_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<BadgeDisplay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub social_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// What a visitor sees at `/u/{handle}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub handle: String,
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub theme: Theme,
    pub pieces: Vec<PublicPiece>,
    pub meta: PageMeta,
}

impl PublicProfile {
    /// Builds the public view; hidden pieces are dropped and the rest keep
    /// their stored order.
    pub fn build(profile: &Profile, pieces: &[Piece]) -> Self {
        let mut visible: Vec<&Piece> = pieces.iter().filter(|piece| piece.is_active).collect();
        visible.sort_by_key(|piece| piece.position);

        Self {
            handle: profile.handle.clone(),
            display_name: profile.display_name.clone(),
            bio: profile.bio.clone(),
            avatar_url: profile.avatar_url.clone(),
            theme: profile.theme,
            pieces: visible
                .into_iter()
                .map(|piece| PublicPiece {
                    id: piece.id,
                    image_url: piece.image_url.clone(),
                    destination_url: piece.destination_url.clone(),
                    title: piece.title.clone(),
                    badge: piece.badge.display(),
                })
                .collect(),
            meta: PageMeta::for_profile(profile),
        }
    }
}

impl PageMeta {
    pub fn for_profile(profile: &Profile) -> Self {
        let description = if profile.bio.is_empty() {
            format!("See {}'s mosaic", profile.display_name)
        } else {
            profile.bio.clone()
        };
        Self {
            title: format!("{} (@{})", profile.display_name, profile.handle),
            description,
            social_title: format!("{} | {SITE_NAME}", profile.display_name),
            image_url: (!profile.avatar_url.is_empty()).then(|| profile.avatar_url.clone()),
        }
    }
}
