use super::*;

#[test]
fn test_wildcard_matches_whole_name() {
    let p = FilePatterns::parse("*.zip").unwrap();
    assert!(p.is_match("Super Game (USA).zip"));
    assert!(!p.is_match("Super Game (USA).zip.bak"));
}

#[test]
fn test_matching_is_case_sensitive() {
    let p = FilePatterns::parse("Super*").unwrap();
    assert!(p.is_match("Super Game.sfc"));
    assert!(!p.is_match("super game.sfc"));
}

#[test]
fn test_comma_separates_patterns() {
    let p = FilePatterns::parse("*(Beta)*,*(Proto)*").unwrap();
    assert_eq!(p.len(), 2);
    assert!(p.is_match("Game (Beta).sfc"));
    assert!(p.is_match("Game (Proto).sfc"));
    assert!(!p.is_match("Game (USA).sfc"));
}

#[test]
fn test_escaped_comma_is_literal() {
    let p = FilePatterns::parse(r"Legend\, The*").unwrap();
    assert_eq!(p.len(), 1);
    assert!(p.is_match("Legend, The (USA).sfc"));
}

#[test]
fn test_regex_metacharacters_are_literal() {
    let p = FilePatterns::parse("Game [!].sfc").unwrap();
    assert!(p.is_match("Game [!].sfc"));
    assert!(!p.is_match("Game !.sfc"));
}

#[test]
fn test_empty_list() {
    let p = FilePatterns::parse("").unwrap();
    assert!(p.is_empty());
    assert!(!p.is_match("anything"));
}
