use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

// A profile id is the identity id handed out by the auth system.
id_newtype!(ProfileId);
id_newtype!(PieceId);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Clean,
    Midnight,
    Candy,
    Brutalist,
    Film,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Clean,
        Theme::Midnight,
        Theme::Candy,
        Theme::Brutalist,
        Theme::Film,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Clean => "clean",
            Theme::Midnight => "midnight",
            Theme::Candy => "candy",
            Theme::Brutalist => "brutalist",
            Theme::Film => "film",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Clean => "Clean",
            Theme::Midnight => "Midnight",
            Theme::Candy => "Candy",
            Theme::Brutalist => "Brutalist",
            Theme::Film => "Film",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Theme::Clean => "Professional, clean, timeless",
            Theme::Midnight => "Elegant, nocturnal, premium",
            Theme::Candy => "Fun, colorful, playful",
            Theme::Brutalist => "Raw, artistic, bold",
            Theme::Film => "Photographic, editorial, cinematic",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "theme",
                value: s.to_string(),
            })
    }
}

/// Fixed badge presets. Their label and emoji come from this table, never from
/// the piece record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgePreset {
    Urgency,
    New,
    Promo,
    Limited,
    Course,
}

impl BadgePreset {
    pub const ALL: [BadgePreset; 5] = [
        BadgePreset::Urgency,
        BadgePreset::New,
        BadgePreset::Promo,
        BadgePreset::Limited,
        BadgePreset::Course,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BadgePreset::Urgency => "Ending soon",
            BadgePreset::New => "New",
            BadgePreset::Promo => "Giveaway",
            BadgePreset::Limited => "Last day",
            BadgePreset::Course => "Course",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            BadgePreset::Urgency => "🔥",
            BadgePreset::New => "✨",
            BadgePreset::Promo => "🎁",
            BadgePreset::Limited => "⏰",
            BadgePreset::Course => "📚",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            BadgePreset::Urgency => "red",
            BadgePreset::New => "emerald",
            BadgePreset::Promo => "purple",
            BadgePreset::Limited => "orange",
            BadgePreset::Course => "blue",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BadgePreset::Urgency => "For content that expires",
            BadgePreset::New => "For recent content",
            BadgePreset::Promo => "For giveaways and contests",
            BadgePreset::Limited => "For limited-time offers",
            BadgePreset::Course => "For educational content",
        }
    }
}

/// Flat discriminant as stored in the `badge_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeType {
    #[default]
    None,
    Urgency,
    New,
    Promo,
    Limited,
    Course,
    Custom,
}

impl BadgeType {
    pub const ALL: [BadgeType; 7] = [
        BadgeType::None,
        BadgeType::Urgency,
        BadgeType::New,
        BadgeType::Promo,
        BadgeType::Limited,
        BadgeType::Course,
        BadgeType::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BadgeType::None => "none",
            BadgeType::Urgency => "urgency",
            BadgeType::New => "new",
            BadgeType::Promo => "promo",
            BadgeType::Limited => "limited",
            BadgeType::Course => "course",
            BadgeType::Custom => "custom",
        }
    }

    pub fn preset(self) -> Option<BadgePreset> {
        match self {
            BadgeType::Urgency => Some(BadgePreset::Urgency),
            BadgeType::New => Some(BadgePreset::New),
            BadgeType::Promo => Some(BadgePreset::Promo),
            BadgeType::Limited => Some(BadgePreset::Limited),
            BadgeType::Course => Some(BadgePreset::Course),
            BadgeType::None | BadgeType::Custom => None,
        }
    }
}

impl From<BadgePreset> for BadgeType {
    fn from(value: BadgePreset) -> Self {
        match value {
            BadgePreset::Urgency => BadgeType::Urgency,
            BadgePreset::New => BadgeType::New,
            BadgePreset::Promo => BadgeType::Promo,
            BadgePreset::Limited => BadgeType::Limited,
            BadgePreset::Course => BadgeType::Course,
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BadgeType::ALL
            .into_iter()
            .find(|badge_type| badge_type.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "badge type",
                value: s.to_string(),
            })
    }
}

/// Decorative label overlaid on a piece.
///
/// On the wire a badge is the three flat fields `badge_type`, `badge_text` and
/// `badge_emoji`; text and emoji only survive for [`Badge::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BadgeRecord", into = "BadgeRecord")]
pub enum Badge {
    #[default]
    None,
    Preset(BadgePreset),
    Custom { text: String, emoji: String },
}

impl Badge {
    pub fn badge_type(&self) -> BadgeType {
        match self {
            Badge::None => BadgeType::None,
            Badge::Preset(preset) => (*preset).into(),
            Badge::Custom { .. } => BadgeType::Custom,
        }
    }

    pub fn display(&self) -> Option<BadgeDisplay> {
        match self {
            Badge::None => None,
            Badge::Preset(preset) => Some(BadgeDisplay {
                emoji: preset.emoji().to_string(),
                text: preset.label().to_string(),
            }),
            Badge::Custom { text, emoji } => Some(BadgeDisplay {
                emoji: emoji.clone(),
                text: text.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BadgeRecord {
    #[serde(default)]
    pub badge_type: BadgeType,
    #[serde(default)]
    pub badge_text: String,
    #[serde(default)]
    pub badge_emoji: String,
}

impl From<BadgeRecord> for Badge {
    fn from(value: BadgeRecord) -> Self {
        match value.badge_type {
            BadgeType::None => Badge::None,
            BadgeType::Custom => Badge::Custom {
                text: value.badge_text,
                emoji: value.badge_emoji,
            },
            other => other.preset().map_or(Badge::None, Badge::Preset),
        }
    }
}

impl From<Badge> for BadgeRecord {
    fn from(value: Badge) -> Self {
        let badge_type = value.badge_type();
        match value {
            Badge::Custom { text, emoji } => BadgeRecord {
                badge_type,
                badge_text: text,
                badge_emoji: emoji,
            },
            Badge::None | Badge::Preset(_) => BadgeRecord {
                badge_type,
                ..BadgeRecord::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDisplay {
    pub emoji: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub handle: String,
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub profile_id: ProfileId,
    pub image_url: String,
    pub destination_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub badge: Badge,
    pub position: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: ProfileId,
    pub handle: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub theme: Theme,
}

/// Partial profile update. There is no handle field: a handle never changes
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPiece {
    pub image_url: String,
    pub destination_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub badge: Badge,
}

impl NewPiece {
    pub fn new(image_url: impl Into<String>, destination_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            destination_url: destination_url.into(),
            title: None,
            badge: Badge::None,
        }
    }
}

/// Partial piece update. An empty `title` clears the stored title.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PiecePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl PiecePatch {
    pub fn position(position: u32) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The authenticated principal a session acts as, plus whatever sign-up
/// metadata the auth system kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: ProfileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn anonymous_metadata(id: ProfileId) -> Self {
        Self {
            id,
            email: None,
            handle: None,
            display_name: None,
        }
    }
}
