use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{
    Badge, BadgeRecord, NewPiece, NewProfile, Piece, PieceId, PiecePatch, Profile, ProfileId,
    ProfilePatch, Theme,
};

const PROFILE_COLUMNS: &str =
    "id, handle, display_name, bio, avatar_url, theme, created_at, updated_at";
const PIECE_COLUMNS: &str = "id, profile_id, image_url, destination_url, title, badge_type, \
     badge_text, badge_emoji, position, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// True when `err` was caused by a UNIQUE or PRIMARY KEY constraint, which is
/// how a duplicate handle or a second profile for one identity surfaces.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO profiles (id, handle, display_name, bio, avatar_url, theme, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(profile.id.to_string())
        .bind(&profile.handle)
        .bind(&profile.display_name)
        .bind(&profile.bio)
        .bind(&profile.avatar_url)
        .bind(profile.theme.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert profile '{}'", profile.handle))?;
        profile_from_row(&row)
    }

    pub async fn load_profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn load_profile_by_handle(&self, handle: &str) -> Result<Option<Profile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE handle = ?"
        ))
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn handle_exists(&self, handle: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE handle = ?")
            .bind(handle)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Applies the non-empty fields of `patch`. Returns `None` when no profile
    /// has this id.
    pub async fn update_profile(
        &self,
        id: ProfileId,
        patch: &ProfilePatch,
    ) -> Result<Option<Profile>> {
        let row = sqlx::query(&format!(
            "UPDATE profiles SET
                 display_name = COALESCE(?1, display_name),
                 bio          = COALESCE(?2, bio),
                 avatar_url   = COALESCE(?3, avatar_url),
                 theme        = COALESCE(?4, theme),
                 updated_at   = ?5
             WHERE id = ?6
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(patch.display_name.as_deref())
        .bind(patch.bio.as_deref())
        .bind(patch.avatar_url.as_deref())
        .bind(patch.theme.map(Theme::as_str))
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update profile {id}"))?;
        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn insert_piece(
        &self,
        owner: ProfileId,
        piece: &NewPiece,
        position: u32,
    ) -> Result<Piece> {
        let now = Utc::now();
        let badge = BadgeRecord::from(piece.badge.clone());
        let row = sqlx::query(&format!(
            "INSERT INTO pieces (id, profile_id, image_url, destination_url, title, badge_type,
                                 badge_text, badge_emoji, position, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)
             RETURNING {PIECE_COLUMNS}"
        ))
        .bind(PieceId::new_v4().to_string())
        .bind(owner.to_string())
        .bind(&piece.image_url)
        .bind(&piece.destination_url)
        .bind(piece.title.as_deref().filter(|title| !title.is_empty()))
        .bind(badge.badge_type.as_str())
        .bind(&badge.badge_text)
        .bind(&badge.badge_emoji)
        .bind(i64::from(position))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert piece for profile {owner}"))?;
        piece_from_row(&row)
    }

    /// All pieces of `owner`, hidden ones included, in display order.
    pub async fn list_pieces(&self, owner: ProfileId) -> Result<Vec<Piece>> {
        let rows = sqlx::query(&format!(
            "SELECT {PIECE_COLUMNS} FROM pieces
             WHERE profile_id = ?
             ORDER BY position ASC, created_at ASC, id ASC"
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(piece_from_row).collect()
    }

    pub async fn list_active_pieces(&self, owner: ProfileId) -> Result<Vec<Piece>> {
        let rows = sqlx::query(&format!(
            "SELECT {PIECE_COLUMNS} FROM pieces
             WHERE profile_id = ? AND is_active = 1
             ORDER BY position ASC, created_at ASC, id ASC"
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(piece_from_row).collect()
    }

    /// Applies `patch` to a piece owned by `owner`. Returns `None` when the
    /// piece does not exist or belongs to someone else.
    pub async fn update_piece(
        &self,
        owner: ProfileId,
        id: PieceId,
        patch: &PiecePatch,
    ) -> Result<Option<Piece>> {
        let badge = patch.badge.clone().map(BadgeRecord::from);
        let row = sqlx::query(&format!(
            "UPDATE pieces SET
                 image_url       = COALESCE(?1, image_url),
                 destination_url = COALESCE(?2, destination_url),
                 title           = CASE WHEN ?3 IS NULL THEN title WHEN ?3 = '' THEN NULL ELSE ?3 END,
                 badge_type      = COALESCE(?4, badge_type),
                 badge_text      = COALESCE(?5, badge_text),
                 badge_emoji     = COALESCE(?6, badge_emoji),
                 position        = COALESCE(?7, position),
                 is_active       = COALESCE(?8, is_active),
                 updated_at      = ?9
             WHERE id = ?10 AND profile_id = ?11
             RETURNING {PIECE_COLUMNS}"
        ))
        .bind(patch.image_url.as_deref())
        .bind(patch.destination_url.as_deref())
        .bind(patch.title.as_deref())
        .bind(badge.as_ref().map(|badge| badge.badge_type.as_str()))
        .bind(badge.as_ref().map(|badge| badge.badge_text.as_str()))
        .bind(badge.as_ref().map(|badge| badge.badge_emoji.as_str()))
        .bind(patch.position.map(i64::from))
        .bind(patch.is_active)
        .bind(Utc::now())
        .bind(id.to_string())
        .bind(owner.to_string())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update piece {id}"))?;
        row.as_ref().map(piece_from_row).transpose()
    }

    /// Returns false when nothing owned by `owner` matched `id`.
    pub async fn delete_piece(&self, owner: ProfileId, id: PieceId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pieces WHERE id = ? AND profile_id = ?")
            .bind(id.to_string())
            .bind(owner.to_string())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete piece {id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).with_context(|| format!("invalid uuid in column '{column}': {raw}"))
}

fn profile_from_row(row: &SqliteRow) -> Result<Profile> {
    let theme: String = row.try_get("theme")?;
    Ok(Profile {
        id: ProfileId(parse_uuid(row, "id")?),
        handle: row.try_get("handle")?,
        display_name: row.try_get("display_name")?,
        bio: row.try_get("bio")?,
        avatar_url: row.try_get("avatar_url")?,
        theme: theme.parse()?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn piece_from_row(row: &SqliteRow) -> Result<Piece> {
    let badge_type: String = row.try_get("badge_type")?;
    let position: i64 = row.try_get("position")?;
    Ok(Piece {
        id: PieceId(parse_uuid(row, "id")?),
        profile_id: ProfileId(parse_uuid(row, "profile_id")?),
        image_url: row.try_get("image_url")?,
        destination_url: row.try_get("destination_url")?,
        title: row.try_get("title")?,
        badge: Badge::from(BadgeRecord {
            badge_type: badge_type.parse()?,
            badge_text: row.try_get("badge_text")?,
            badge_emoji: row.try_get("badge_emoji")?,
        }),
        position: u32::try_from(position)
            .with_context(|| format!("piece position out of range: {position}"))?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
