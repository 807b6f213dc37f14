use super::*;
use shared::domain::BadgePreset;

fn piece(title: &str, position: u32) -> Piece {
    let json = serde_json::json!({
        "id": PieceId::new_v4(),
        "profile_id": ProfileId::new_v4(),
        "image_url": format!("https://cdn.example/{title}.png"),
        "destination_url": format!("https://example.com/{title}"),
        "title": title,
        "badge_type": "none",
        "position": position,
        "is_active": true,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z",
    });
    serde_json::from_value(json).expect("piece")
}

fn titles(pieces: &[Piece]) -> Vec<&str> {
    pieces
        .iter()
        .map(|piece| piece.title.as_deref().unwrap_or_default())
        .collect()
}

#[test]
fn pieces_resolve_by_list_number_or_id() {
    let pieces = vec![piece("a", 0), piece("b", 1)];

    assert_eq!(resolve_piece(&pieces, "2").expect("number"), pieces[1].id);
    assert_eq!(
        resolve_piece(&pieces, &pieces[0].id.to_string()).expect("id"),
        pieces[0].id
    );
    assert!(resolve_piece(&pieces, "0").is_err());
    assert!(resolve_piece(&pieces, "3").is_err());
    assert!(resolve_piece(&pieces, &PieceId::new_v4().to_string()).is_err());
    assert!(resolve_piece(&pieces, "first").is_err());
}

#[test]
fn order_must_name_every_piece_once() {
    let pieces = vec![piece("a", 0), piece("b", 1), piece("c", 2)];
    let names = |names: &[&str]| names.iter().map(|name| name.to_string()).collect::<Vec<_>>();

    let sequence = order_sequence(&pieces, &names(&["3", "1", "2"])).expect("order");
    assert_eq!(titles(&sequence), ["c", "a", "b"]);

    assert!(order_sequence(&pieces, &names(&["1", "2"])).is_err());
    assert!(order_sequence(&pieces, &names(&["1", "1", "2"])).is_err());
}

#[test]
fn badge_flags_build_a_badge() {
    let none = BadgeArgs::default();
    assert_eq!(none.badge().expect("badge"), None);

    let preset = BadgeArgs {
        badge_type: Some(BadgeType::Limited),
        ..BadgeArgs::default()
    };
    assert_eq!(preset.badge().expect("badge"), Some(Badge::Preset(BadgePreset::Limited)));

    let custom = BadgeArgs {
        badge_type: Some(BadgeType::Custom),
        badge_text: Some("Drop 2".to_string()),
        badge_emoji: Some("🧵".to_string()),
    };
    assert_eq!(
        custom.badge().expect("badge"),
        Some(Badge::Custom {
            text: "Drop 2".to_string(),
            emoji: "🧵".to_string(),
        })
    );

    let cleared = BadgeArgs {
        badge_type: Some(BadgeType::None),
        ..BadgeArgs::default()
    };
    assert_eq!(cleared.badge().expect("badge"), Some(Badge::None));
}

#[test]
fn custom_badge_fields_imply_custom_and_clash_with_presets() {
    let implied = BadgeArgs {
        badge_text: Some("Last call".to_string()),
        ..BadgeArgs::default()
    };
    assert_eq!(
        implied.badge().expect("badge"),
        Some(Badge::Custom {
            text: "Last call".to_string(),
            emoji: String::new(),
        })
    );

    let clash = BadgeArgs {
        badge_type: Some(BadgeType::Promo),
        badge_emoji: Some("🔥".to_string()),
        ..BadgeArgs::default()
    };
    assert!(clash.badge().is_err());
}

#[test]
fn cli_parses_piece_commands() {
    let cli = Cli::try_parse_from([
        "mosai",
        "--server-url",
        "http://localhost:9000",
        "pieces",
        "add",
        "https://cdn.example/a.png",
        "https://example.com",
        "--title",
        "Shop",
        "--badge",
        "promo",
    ])
    .expect("parse");

    assert_eq!(cli.server_url, "http://localhost:9000");
    match cli.command {
        Command::Pieces(PiecesCommand::Add { title, badge, .. }) => {
            assert_eq!(title.as_deref(), Some("Shop"));
            assert_eq!(badge.badge().expect("badge"), Some(Badge::Preset(BadgePreset::Promo)));
        }
        other => panic!("unexpected command {other:?}"),
    }

    assert!(Cli::try_parse_from(["mosai", "profile", "set", "--theme", "neon"]).is_err());
    assert!(Cli::try_parse_from(["mosai", "pieces", "order"]).is_err());
}

#[test]
fn list_numbers_start_at_one() {
    assert_eq!(list_index(1).expect("index"), 0);
    assert!(list_index(0).is_err());
}
