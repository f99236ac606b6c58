use super::*;

fn opts_with_alias(base: &str, alias: &str) -> NamingOptions {
    let mut aliases = HashMap::new();
    aliases.insert(base.to_string(), alias.to_string());
    NamingOptions {
        aliases: Arc::new(aliases),
        ..Default::default()
    }
}

#[test]
fn test_strip_annotations() {
    assert_eq!(strip_annotations("Super Game (USA) [!]"), "Super Game");
    assert_eq!(strip_annotations("Super Game (USA (Rev 1))"), "Super Game");
    assert_eq!(strip_annotations("Super Game - (Beta)"), "Super Game");
    assert_eq!(strip_annotations("Plain"), "Plain");
}

#[test]
fn test_sanitize() {
    assert_eq!(sanitize("Disney's Aladdin"), "disneys aladdin");
    assert_eq!(sanitize("Tom & Jerry"), "tom and jerry");
    assert_eq!(sanitize("Street Fighter II: Turbo"), "street fighter 2 turbo");
    assert_eq!(sanitize("X-Men"), "x men");
}

#[test]
fn test_roman_conversion() {
    assert_eq!(to_roman(4), "IV");
    assert_eq!(to_roman(39), "XXXIX");
    assert_eq!(from_roman("xiv"), Some(14));
    assert_eq!(from_roman("IIII"), None);
    assert_eq!(from_roman("mix"), None);
    assert_eq!(from_roman(""), None);
}

#[test]
fn test_numeral() {
    assert_eq!(numeral("Super Game"), 1);
    assert_eq!(numeral("Super Game 2"), 2);
    assert_eq!(numeral("Super Game II"), 2);
    assert_eq!(numeral("Super Game 1"), 1);
    assert_eq!(numeral("Strike Force 1942"), 1);
}

#[test]
fn test_swap_numeral() {
    assert_eq!(swap_numeral("Super Game 2").as_deref(), Some("Super Game II"));
    assert_eq!(swap_numeral("Super Game III").as_deref(), Some("Super Game 3"));
    assert_eq!(
        swap_numeral("Super Game 2: The Return").as_deref(),
        Some("Super Game II: The Return")
    );
    assert_eq!(swap_numeral("Super Game"), None);
    assert_eq!(swap_numeral("2 Fast"), None);
}

#[test]
fn test_split_subtitle() {
    assert_eq!(
        split_subtitle("Castlevania: Symphony of the Night"),
        Some(("Castlevania", "Symphony of the Night"))
    );
    assert_eq!(split_subtitle("Mega Game - Part Two"), Some(("Mega Game", "Part Two")));
    assert_eq!(split_subtitle("Spider-Man"), None);
}

#[test]
fn test_clean_title_moves_article() {
    assert_eq!(clean_title("Legend_of_Zelda,_The_(USA)"), "The Legend of Zelda");
    assert_eq!(
        clean_title("Legend of Zelda, The - A Link to the Past (USA)"),
        "The Legend of Zelda - A Link to the Past"
    );
    assert_eq!(clean_title("Super Game (Europe) (En,Fr,De)"), "Super Game");
}

#[test]
fn test_canonical_article_and_edition() {
    assert_eq!(canonical_article("the legend of zelda"), "legend of zelda");
    assert_eq!(canonical_article("legend of zelda the"), "legend of zelda");
    assert_eq!(strip_edition("super game special edition"), "super game");
    assert_eq!(strip_edition("special edition"), "special edition");
}

#[test]
fn test_significant_words() {
    assert_eq!(
        significant_words("the legend of zelda"),
        vec!["legend", "zelda"]
    );
}

#[test]
fn test_search_names_order() {
    let names = search_names("Super Game 2: The Return (USA)", &NamingOptions::default());
    assert_eq!(
        names,
        vec![
            "Super Game 2: The Return",
            "Super Game II: The Return",
            "Super Game 2",
            "Super Game II",
        ]
    );
}

#[test]
fn test_search_names_without_subtitle_dropping() {
    let opts = NamingOptions {
        drop_subtitles: false,
        ..Default::default()
    };
    let names = search_names("Super Game 2: The Return (USA)", &opts);
    assert_eq!(names, vec!["Super Game 2: The Return", "Super Game II: The Return"]);
}

#[test]
fn test_search_names_alias_first_and_truncated() {
    let mut opts = opts_with_alias("sg2", "Super Game 2");
    opts.max_names = 2;
    let names = search_names("sg2", &opts);
    assert_eq!(names, vec!["Super Game 2", "sg2"]);
}

#[test]
fn test_search_names_deduplicates() {
    let opts = opts_with_alias("Super Game", "super game");
    let names = search_names("Super Game", &opts);
    assert_eq!(names, vec!["super game"]);
}

#[test]
fn test_compare_title() {
    let opts = opts_with_alias("sg2", "Super Game 2");
    assert_eq!(compare_title("sg2", &opts), "Super Game 2");
    assert_eq!(
        compare_title("Game, The (USA)", &NamingOptions::default()),
        "The Game"
    );
}
