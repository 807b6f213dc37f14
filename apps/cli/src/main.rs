use std::{collections::HashSet, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    http_store::DEFAULT_SERVER_URL, ClientConfig, HttpRemoteStore, PieceCollection,
    ProfileController,
};
use shared::domain::{
    Badge, BadgeType, Identity, NewPiece, Piece, PieceId, PiecePatch, Profile, ProfileId,
    ProfilePatch, Theme,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mosai", about = "Manage a MOSAI link-in-bio page")]
struct Cli {
    #[arg(long, env = "MOSAI_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    /// Identity to act as. `public` and `handle` work without one.
    #[arg(long, env = "MOSAI_USER_ID")]
    user_id: Option<ProfileId>,
    /// Sign-up metadata used to pick defaults for a brand-new profile.
    #[arg(long, env = "MOSAI_EMAIL")]
    email: Option<String>,
    #[arg(long, env = "MOSAI_HANDLE")]
    handle: Option<String>,
    #[arg(long, env = "MOSAI_DISPLAY_NAME")]
    display_name: Option<String>,
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Profile(ProfileCommand),
    #[command(subcommand)]
    Pieces(PiecesCommand),
    /// Print the published page for a handle as JSON.
    Public { handle: String },
    /// Check whether a handle is still free.
    Handle { handle: String },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Set {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        #[arg(long)]
        theme: Option<Theme>,
    },
}

#[derive(Args, Debug, Default)]
struct BadgeArgs {
    /// none, urgency, new, promo, limited, course or custom
    #[arg(long = "badge")]
    badge_type: Option<BadgeType>,
    #[arg(long)]
    badge_text: Option<String>,
    #[arg(long)]
    badge_emoji: Option<String>,
}

impl BadgeArgs {
    /// `--badge-text` or `--badge-emoji` alone imply `--badge custom`.
    fn badge(&self) -> Result<Option<Badge>> {
        let custom_fields = self.badge_text.is_some() || self.badge_emoji.is_some();
        let badge_type = match (self.badge_type, custom_fields) {
            (None, false) => return Ok(None),
            (None, true) | (Some(BadgeType::Custom), _) => BadgeType::Custom,
            (Some(other), true) => {
                bail!("--badge-text and --badge-emoji only apply to --badge custom, not {other}")
            }
            (Some(other), false) => other,
        };

        let badge = match badge_type {
            BadgeType::None => Badge::None,
            BadgeType::Custom => Badge::Custom {
                text: self.badge_text.clone().unwrap_or_default(),
                emoji: self.badge_emoji.clone().unwrap_or_default(),
            },
            preset => preset.preset().map_or(Badge::None, Badge::Preset),
        };
        Ok(Some(badge))
    }
}

/// Pieces are named by their list number (from 1) or by id.
#[derive(Subcommand, Debug)]
enum PiecesCommand {
    List,
    Add {
        image_url: String,
        destination_url: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        badge: BadgeArgs,
    },
    Edit {
        piece: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        destination_url: Option<String>,
        /// An empty title clears it.
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        badge: BadgeArgs,
    },
    Remove {
        piece: String,
    },
    /// Flip a piece between shown and hidden.
    Toggle {
        piece: String,
    },
    /// Move the piece at list number FROM to list number TO.
    Move {
        from: usize,
        to: usize,
    },
    /// Set the full order, naming every piece once.
    Order {
        #[arg(required = true)]
        pieces: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config = ClientConfig::new(&cli.server_url)
        .with_context(|| format!("invalid server url '{}'", cli.server_url))?
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let identity = cli.user_id.map(|id| Identity {
        id,
        email: cli.email.clone(),
        handle: cli.handle.clone(),
        display_name: cli.display_name.clone(),
    });
    let signed_in = identity.is_some();
    let store = Arc::new(HttpRemoteStore::new(&config, identity)?);

    match cli.command {
        Command::Profile(command) => {
            require_identity(signed_in)?;
            run_profile(store, command).await
        }
        Command::Pieces(command) => {
            require_identity(signed_in)?;
            run_pieces(store, command).await
        }
        Command::Public { handle } => {
            let view = store.public_profile(&handle).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        Command::Handle { handle } => {
            let availability = store.handle_availability(&handle).await?;
            let verdict = if availability.available {
                "available"
            } else {
                "taken"
            };
            println!("@{} is {verdict}", availability.handle);
            Ok(())
        }
    }
}

fn require_identity(signed_in: bool) -> Result<()> {
    if !signed_in {
        bail!("set --user-id or MOSAI_USER_ID to manage a profile");
    }
    Ok(())
}

async fn run_profile(store: Arc<HttpRemoteStore>, command: ProfileCommand) -> Result<()> {
    let mut controller = ProfileController::new(store);
    match command {
        ProfileCommand::Show => print_profile(controller.load().await?),
        ProfileCommand::Set {
            display_name,
            bio,
            avatar_url,
            theme,
        } => {
            let patch = ProfilePatch {
                display_name,
                bio,
                avatar_url,
                theme,
            };
            if patch.is_empty() {
                bail!("nothing to change: pass --display-name, --bio, --avatar-url or --theme");
            }
            controller.load().await?;
            print_profile(controller.update(patch).await?);
        }
    }
    Ok(())
}

async fn run_pieces(store: Arc<HttpRemoteStore>, command: PiecesCommand) -> Result<()> {
    // Pieces hang off the profile row, which the first load creates.
    ProfileController::new(store.clone()).load().await?;
    let mut pieces = PieceCollection::new(store);
    pieces.load().await?;

    match command {
        PiecesCommand::List => {}
        PiecesCommand::Add {
            image_url,
            destination_url,
            title,
            badge,
        } => {
            let mut input = NewPiece::new(image_url, destination_url);
            input.title = title;
            input.badge = badge.badge()?.unwrap_or_default();
            let piece = pieces.create(input).await?;
            info!(piece_id = %piece.id, position = piece.position, "piece added");
        }
        PiecesCommand::Edit {
            piece,
            image_url,
            destination_url,
            title,
            badge,
        } => {
            let id = resolve_piece(pieces.pieces(), &piece)?;
            let patch = PiecePatch {
                image_url,
                destination_url,
                title,
                badge: badge.badge()?,
                ..PiecePatch::default()
            };
            if patch.is_empty() {
                bail!("nothing to change for piece {piece}");
            }
            pieces.update(id, patch).await?;
        }
        PiecesCommand::Remove { piece } => {
            let id = resolve_piece(pieces.pieces(), &piece)?;
            pieces.delete(id).await?;
        }
        PiecesCommand::Toggle { piece } => {
            let id = resolve_piece(pieces.pieces(), &piece)?;
            let shown = pieces.get(id).is_some_and(|piece| piece.is_active);
            pieces.toggle_active(id, !shown).await?;
        }
        PiecesCommand::Move { from, to } => {
            pieces
                .move_piece(list_index(from)?, list_index(to)?)
                .await?;
        }
        PiecesCommand::Order { pieces: names } => {
            let sequence = order_sequence(pieces.pieces(), &names)?;
            pieces.reorder(sequence).await?;
        }
    }

    print_pieces(pieces.pieces());
    Ok(())
}

fn list_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or_else(|| anyhow!("list numbers start at 1"))
}

fn resolve_piece(pieces: &[Piece], name: &str) -> Result<PieceId> {
    if let Ok(number) = name.parse::<usize>() {
        return list_index(number)
            .ok()
            .and_then(|index| pieces.get(index))
            .map(|piece| piece.id)
            .ok_or_else(|| anyhow!("no piece number {number}; the list has {}", pieces.len()));
    }

    let id: PieceId = name
        .parse()
        .with_context(|| format!("'{name}' is neither a list number nor a piece id"))?;
    if !pieces.iter().any(|piece| piece.id == id) {
        bail!("no piece with id {id}");
    }
    Ok(id)
}

fn order_sequence(pieces: &[Piece], names: &[String]) -> Result<Vec<Piece>> {
    let mut seen = HashSet::new();
    let mut sequence = Vec::with_capacity(names.len());
    for name in names {
        let id = resolve_piece(pieces, name)?;
        if !seen.insert(id) {
            bail!("piece {name} is listed twice");
        }
        if let Some(piece) = pieces.iter().find(|piece| piece.id == id) {
            sequence.push(piece.clone());
        }
    }
    if sequence.len() != pieces.len() {
        bail!(
            "the new order names {} of {} pieces; list every piece once",
            sequence.len(),
            pieces.len()
        );
    }
    Ok(sequence)
}

fn print_profile(profile: &Profile) {
    println!("@{}  {}", profile.handle, profile.display_name);
    if !profile.bio.is_empty() {
        println!("{}", profile.bio);
    }
    if !profile.avatar_url.is_empty() {
        println!("avatar: {}", profile.avatar_url);
    }
    println!("theme: {} ({})", profile.theme.label(), profile.theme);
}

fn print_pieces(pieces: &[Piece]) {
    if pieces.is_empty() {
        println!("no pieces yet");
        return;
    }
    for (index, piece) in pieces.iter().enumerate() {
        let title = piece.title.as_deref().unwrap_or("(untitled)");
        let state = if piece.is_active { "shown" } else { "hidden" };
        let badge = piece
            .badge
            .display()
            .map(|badge| format!("  {} {}", badge.emoji, badge.text))
            .unwrap_or_default();
        println!(
            "{:>3}. {title} -> {} [{state}]{badge}",
            index + 1,
            piece.destination_url
        );
        println!("     {}", piece.id);
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
