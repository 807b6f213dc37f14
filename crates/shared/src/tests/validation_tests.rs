use super::*;
use crate::domain::{BadgePreset, ProfileId, Theme};

#[test]
fn accepts_well_formed_handles() {
    for handle in ["abc", "ana-lopez", "a1b2", "x-y-z", &"a".repeat(30)] {
        assert_eq!(validate_handle(handle), Ok(()), "{handle}");
    }
}

#[test]
fn rejects_malformed_handles() {
    assert_eq!(validate_handle("ab"), Err(ValidationError::HandleLength));
    assert_eq!(
        validate_handle(&"a".repeat(31)),
        Err(ValidationError::HandleLength)
    );
    assert_eq!(validate_handle("-abc"), Err(ValidationError::HandleFormat));
    assert_eq!(validate_handle("abc-"), Err(ValidationError::HandleFormat));
    assert_eq!(validate_handle("Abc"), Err(ValidationError::HandleFormat));
    assert_eq!(validate_handle("a_bc"), Err(ValidationError::HandleFormat));
}

#[test]
fn slugify_folds_free_text_into_a_handle() {
    assert_eq!(slugify_handle("Jane.Doe"), Some("jane-doe".to_string()));
    assert_eq!(slugify_handle("  --Mr  X 99-- "), Some("mr-x-99".to_string()));
    assert_eq!(slugify_handle("é"), None);
    assert_eq!(slugify_handle("ab"), None);

    let long = slugify_handle(&"abcde-".repeat(10)).expect("slug");
    assert!(long.chars().count() <= HANDLE_MAX_CHARS);
    assert!(!long.ends_with('-'));
}

#[test]
fn destination_url_must_be_http() {
    let mut piece = NewPiece::new("https://cdn.example/a.png", "ftp://example.com");
    assert_eq!(
        validate_new_piece(&piece),
        Err(ValidationError::UnsupportedScheme {
            field: "destination_url"
        })
    );

    piece.destination_url = "not a url".to_string();
    assert_eq!(
        validate_new_piece(&piece),
        Err(ValidationError::InvalidUrl {
            field: "destination_url"
        })
    );

    piece.destination_url = "https://example.com".to_string();
    assert_eq!(validate_new_piece(&piece), Ok(()));
}

#[test]
fn custom_badge_text_is_limited_but_presets_are_not_checked() {
    let mut piece = NewPiece::new("https://cdn.example/a.png", "https://example.com");
    piece.badge = Badge::Custom {
        text: "x".repeat(25),
        emoji: String::new(),
    };
    assert!(matches!(
        validate_new_piece(&piece),
        Err(ValidationError::Length {
            field: "badge_text",
            ..
        })
    ));

    piece.badge = Badge::Preset(BadgePreset::Promo);
    assert_eq!(validate_new_piece(&piece), Ok(()));
}

#[test]
fn profile_lengths_count_characters() {
    let profile = NewProfile {
        id: ProfileId::new_v4(),
        handle: "ana".to_string(),
        display_name: "ñ".repeat(50),
        bio: "é".repeat(160),
        avatar_url: String::new(),
        theme: Theme::Clean,
    };
    assert_eq!(validate_new_profile(&profile), Ok(()));

    let patch = ProfilePatch {
        display_name: Some(String::new()),
        ..ProfilePatch::default()
    };
    assert!(validate_profile_patch(&patch).is_err());

    let patch = ProfilePatch {
        avatar_url: Some("nope".to_string()),
        ..ProfilePatch::default()
    };
    assert_eq!(
        validate_profile_patch(&patch),
        Err(ValidationError::InvalidUrl {
            field: "avatar_url"
        })
    );
}

#[test]
fn validation_errors_become_validation_api_errors() {
    let api: ApiError = ValidationError::HandleLength.into();
    assert_eq!(api.code, ErrorCode::Validation);
    assert!(api.message.contains("handle"));
}
