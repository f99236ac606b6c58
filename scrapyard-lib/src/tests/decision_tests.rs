use super::*;

fn flags() -> ActionFlags {
    ActionFlags::default()
}

fn cached(meaningful: bool, completeness: u8) -> CacheState {
    CacheState {
        has_any_entries: true,
        has_own_entries: true,
        has_meaningful_entries: meaningful,
        completeness,
        previously_unmatched: false,
    }
}

#[test]
fn test_every_input_has_an_action() {
    let bools = [false, true];
    for from_cache in bools {
        for rescan in bools {
            for refresh in bools {
                for only_missing in bools {
                    for get_missing_resources in bools {
                        for has_any_entries in bools {
                            for has_own_entries in bools {
                                for has_meaningful_entries in bools {
                                    for previously_unmatched in bools {
                                        for completeness in [0, 50, 100] {
                                            let f = ActionFlags {
                                                from_cache,
                                                rescan,
                                                refresh,
                                                only_missing,
                                                get_missing_resources,
                                            };
                                            let s = CacheState {
                                                has_any_entries,
                                                has_own_entries,
                                                has_meaningful_entries,
                                                completeness,
                                                previously_unmatched,
                                            };
                                            assert!(
                                                decide_action(&f, &s).is_some(),
                                                "{f:?} {s:?}"
                                            );
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_cache_source() {
    let f = ActionFlags {
        from_cache: true,
        refresh: true,
        ..flags()
    };
    assert_eq!(decide_action(&f, &cached(true, 100)), Some(Action::ServeFromCache));
    assert_eq!(
        decide_action(&f, &CacheState::default()),
        Some(Action::Skip(SkipReason::NotInCache))
    );
}

#[test]
fn test_rescan_updates_known_files() {
    let f = ActionFlags {
        rescan: true,
        ..flags()
    };
    assert_eq!(decide_action(&f, &cached(true, 100)), Some(Action::Update));
    assert_eq!(decide_action(&f, &CacheState::default()), Some(Action::Refresh));
}

#[test]
fn test_refresh_overrides_cache() {
    let f = ActionFlags {
        refresh: true,
        ..flags()
    };
    assert_eq!(decide_action(&f, &cached(true, 100)), Some(Action::Refresh));
}

#[test]
fn test_only_missing_skips_anything_cached() {
    let f = ActionFlags {
        only_missing: true,
        ..flags()
    };
    let other_source_only = CacheState {
        has_any_entries: true,
        ..CacheState::default()
    };
    assert_eq!(
        decide_action(&f, &other_source_only),
        Some(Action::Skip(SkipReason::OnlyMissing))
    );
    assert_eq!(decide_action(&f, &CacheState::default()), Some(Action::Refresh));
}

#[test]
fn test_missing_resources_updates_incomplete_records() {
    let f = ActionFlags {
        get_missing_resources: true,
        ..flags()
    };
    assert_eq!(decide_action(&f, &cached(true, 60)), Some(Action::Update));
    assert_eq!(
        decide_action(&f, &cached(true, 100)),
        Some(Action::Skip(SkipReason::AlreadyCached))
    );
}

#[test]
fn test_default_run() {
    assert_eq!(
        decide_action(&flags(), &cached(true, 40)),
        Some(Action::Skip(SkipReason::AlreadyCached))
    );
    assert_eq!(decide_action(&flags(), &cached(false, 10)), Some(Action::Refresh));
    assert_eq!(decide_action(&flags(), &CacheState::default()), Some(Action::Refresh));
}

#[test]
fn test_previously_unmatched() {
    let state = CacheState {
        previously_unmatched: true,
        ..CacheState::default()
    };
    assert_eq!(
        decide_action(&flags(), &state),
        Some(Action::Skip(SkipReason::PreviouslyUnmatched))
    );
    let rescan = ActionFlags {
        rescan: true,
        ..flags()
    };
    assert_eq!(decide_action(&rescan, &state), Some(Action::Refresh));
}
