use spotrip::utils::*;

#[test]
fn test_sanitize_filename_replaces_invalid_characters() {
    assert_eq!(
        sanitize_filename("AC/DC - Back In Black"),
        Some("AC_DC_-_Back_In_Black".to_string())
    );
    assert_eq!(
        sanitize_filename("What? <Live> \"2020\""),
        Some("What_Live_2020".to_string())
    );
}

#[test]
fn test_sanitize_filename_collapses_separators() {
    // whitespace and underscore runs become a single underscore
    assert_eq!(
        sanitize_filename("  a \t b __ c  "),
        Some("a_b_c".to_string())
    );
    assert_eq!(sanitize_filename("___x___"), Some("x".to_string()));
}

#[test]
fn test_sanitize_filename_rejects_empty_results() {
    assert_eq!(sanitize_filename(""), None);
    assert_eq!(sanitize_filename("   "), None);
    assert_eq!(sanitize_filename("???"), None);
    assert_eq!(sanitize_filename("."), None);
    assert_eq!(sanitize_filename(".."), None);
}

#[test]
fn test_sanitize_filename_keeps_unicode() {
    assert_eq!(
        sanitize_filename("Sigur Rós - Hoppípolla"),
        Some("Sigur_Rós_-_Hoppípolla".to_string())
    );
}

#[test]
fn test_sanitize_or_uses_fallback() {
    assert_eq!(sanitize_or("|||", "track"), "track");
    assert_eq!(sanitize_or("Song", "track"), "Song");
}

#[test]
fn test_search_query() {
    assert_eq!(
        search_query("Daft Punk", "One More Time", Some("Discovery")),
        "Daft Punk One More Time Discovery Audio"
    );
    assert_eq!(
        search_query("Daft Punk", "One More Time", None),
        "Daft Punk One More Time Audio"
    );
    // blank album is left out
    assert_eq!(search_query("A", "B", Some("  ")), "A B Audio");
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(0), "0:00");
    assert_eq!(format_duration(59_999), "0:59");
    assert_eq!(format_duration(213_573), "3:33");
    assert_eq!(format_duration(3_600_000), "60:00");
}

#[tokio::test]
async fn test_ensure_dir_exists() {
    let dir = std::env::temp_dir().join(format!("spotrip-utils-{}", rand::random::<u32>()));
    let nested = dir.join("a/b");

    assert!(ensure_dir_exists(&nested).await.unwrap());
    assert!(!ensure_dir_exists(&nested).await.unwrap());
    assert!(nested.is_dir());

    std::fs::remove_dir_all(&dir).unwrap();
}
