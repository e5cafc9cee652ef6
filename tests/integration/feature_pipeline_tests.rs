#[path = "../common/mod.rs"]
mod common;

use approx::assert_abs_diff_eq;
use hoops_processor::{
    model::{
        config::FeatureConfig,
        error::FeatureError,
        feature_model::FeatureProcessor,
        game_log::{GameLog, InMemoryGameLog}
    },
    utils::test_utils::{date, generate_box_score, generate_game, generate_season}
};

use common::{init_test_env, league, season_log};

#[test]
fn test_every_game_gets_features() {
    init_test_env();
    let (games, log) = season_log(7);
    let league = league();
    let processor = FeatureProcessor::new(&log, &league, FeatureConfig::default());

    processor.warm([2024]).unwrap();
    let result = processor.process(&games);

    assert!(result.failures.is_empty());
    assert_eq!(result.features.len(), games.len());

    // teamPer, startersPer, 8 ranked players, teamPerForm and 7 injury stats
    for game in &result.features {
        assert_eq!(game.features.len(), 18 * 3);
    }
}

#[test]
fn test_diff_is_home_minus_away() {
    init_test_env();
    let (games, log) = season_log(11);
    let league = league();
    let processor = FeatureProcessor::new(&log, &league, FeatureConfig::default());

    let result = processor.process(&games);

    for game in &result.features {
        for (key, diff) in game.features.iter().filter(|(k, _)| k.ends_with("|diff")) {
            let prefix = key.trim_end_matches("diff");
            let home = game.features.get(&format!("{}home", prefix)).unwrap();
            let away = game.features.get(&format!("{}away", prefix)).unwrap();

            assert_eq!(diff, home - away, "{}", key);
        }
    }
}

#[test]
fn test_season_opener_has_no_history() {
    init_test_env();
    let (games, log) = season_log(3);
    let league = league();
    let processor = FeatureProcessor::new(&log, &league, FeatureConfig::default());

    let opener = processor.process_game(&games[0]).unwrap();

    assert!(opener.features.iter().all(|(_, v)| v == 0.0));
}

#[test]
fn test_late_season_features_are_populated() {
    init_test_env();
    let (games, log) = season_log(5);
    let league = league();
    let processor = FeatureProcessor::new(&log, &league, FeatureConfig::default());

    let last = processor.process_game(games.last().unwrap()).unwrap();

    for side in ["home", "away"] {
        let team_per = last.features.get(&format!("teamPer|season|weighted_MPG|{}", side)).unwrap();
        let form = last.features.get(&format!("teamPerForm|none|recency|{}", side)).unwrap();
        let top = last.features.get(&format!("player_1_per|season|raw|{}", side)).unwrap();

        assert!(team_per > 0.0);
        assert!(form > 0.0);
        assert!(top > 0.0);
    }
}

#[test]
fn test_processing_is_deterministic() {
    init_test_env();
    let (games, log) = season_log(21);
    let league = league();

    let first = FeatureProcessor::new(&log, &league, FeatureConfig::default()).process(&games);
    let second = FeatureProcessor::new(&log, &league, FeatureConfig::default()).process(&games);

    assert_eq!(first.features, second.features);
}

#[test]
fn test_future_games_do_not_change_roster() {
    init_test_env();
    let (games, box_scores) = generate_season(13, 8, 30, date(2023, 11, 1), 2024);
    let as_of = date(2023, 11, 15);

    let full = InMemoryGameLog::new(games.clone(), box_scores.clone()).unwrap();
    let truncated = InMemoryGameLog::new(
        games.iter().filter(|g| g.date < as_of).cloned().collect(),
        box_scores.into_iter().filter(|r| r.game_date < as_of).collect()
    )
    .unwrap();

    let league = league();
    let config = FeatureConfig::default();
    let full_processor = FeatureProcessor::new(&full, &league, config);
    let truncated_processor = FeatureProcessor::new(&truncated, &league, config);

    for team_id in 1..=8 {
        assert_eq!(
            full_processor.resolve_roster(team_id, 2024, as_of),
            truncated_processor.resolve_roster(team_id, 2024, as_of)
        );
    }
}

#[test]
fn test_excluded_game_types_are_ignored() {
    init_test_env();
    let (games, box_scores) = generate_season(17, 8, 20, date(2023, 11, 1), 2024);
    let baseline = InMemoryGameLog::new(games.clone(), box_scores.clone()).unwrap();

    // A lopsided preseason game before the season that must not register
    let mut preseason = generate_game(9999, 2024, date(2023, 10, 20), 1, 2);
    preseason.game_type = "Preseason".to_string();

    let mut with_preseason_games = games.clone();
    with_preseason_games.push(preseason);

    let mut with_preseason_rows = box_scores;
    with_preseason_rows.push(generate_box_score(100, 9999, 1, date(2023, 10, 20), 48.0));
    with_preseason_rows.push(generate_box_score(999, 9999, 2, date(2023, 10, 20), 48.0));

    let with_preseason = InMemoryGameLog::new(with_preseason_games, with_preseason_rows).unwrap();
    let league = league();

    let targets = with_preseason.target_games("nba", 2024, &league.exclude_game_types);
    assert_eq!(targets.len(), games.len());

    let expected = FeatureProcessor::new(&baseline, &league, FeatureConfig::default()).process(&games);
    let actual = FeatureProcessor::new(&with_preseason, &league, FeatureConfig::default()).process(&targets);

    assert_eq!(expected.features, actual.features);
}

#[test]
fn test_season_without_data_fails() {
    init_test_env();
    let (_, log) = season_log(1);
    let league = league();
    let processor = FeatureProcessor::new(&log, &league, FeatureConfig::default());

    assert!(matches!(
        processor.warm([2025]),
        Err(FeatureError::DataInsufficientError { season: 2025, .. })
    ));

    let orphan = generate_game(5000, 2025, date(2024, 11, 1), 1, 2);
    let result = processor.process(&[orphan]);

    assert!(result.features.is_empty());
    assert_eq!(result.failures.len(), 1);
    assert!(matches!(
        result.failures[0],
        (5000, FeatureError::DataInsufficientError { .. })
    ));
}

#[test]
fn test_injured_starters_register() {
    init_test_env();
    let (mut games, box_scores) = generate_season(29, 8, 30, date(2023, 11, 1), 2024);

    let target = games.last_mut().unwrap();
    let home = target.home_team_id;
    target.home_injuries = vec![home * 100, home * 100 + 1];
    let target = target.clone();

    let log = InMemoryGameLog::new(games, box_scores).unwrap();
    assert_eq!(log.injured_player_ids(target.id, home).len(), 2);

    let league = league();
    let processor = FeatureProcessor::new(&log, &league, FeatureConfig::default());
    let features = processor.process_game(&target).unwrap().features;

    let get = |key: &str| features.get(key).unwrap();

    assert!(get("injMinLost|none|raw|home") > 0.0);
    assert_eq!(get("injMinLost|none|raw|away"), 0.0);
    assert_eq!(get("injRotation|none|raw|home"), 2.0);

    let severity = get("injurySeverity|none|raw|home");
    assert!(severity > 0.0 && severity <= 1.0);

    let top1 = get("injTop1Per|none|raw|home");
    assert!(top1 > 0.0);
    assert!(get("injTop3PerSum|none|raw|home") >= top1);
    assert_abs_diff_eq!(
        get("inj_impact|none|blend|home"),
        0.45 * severity + 0.35 * top1 + 0.20 * 2.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_injury_features_match_processor() {
    init_test_env();
    let (games, log) = season_log(31);
    let league = league();
    let processor = FeatureProcessor::new(&log, &league, FeatureConfig::default());
    let target = games.last().unwrap();

    let injured = [target.away_team_id * 100 + 2].into_iter().collect();
    let injuries = processor
        .compute_injury_features(target.away_team_id, 2024, target.date, &injured)
        .unwrap();

    assert_eq!(injuries.inj_rotation, 1);
    assert!(injuries.inj_min_lost >= 28.0 && injuries.inj_min_lost < 38.0);
    assert!(injuries.team_rotation_mpg > injuries.inj_min_lost);
}

#[test]
fn test_rank_feature_count_follows_config() {
    init_test_env();
    let (games, log) = season_log(37);
    let league = league();
    let config = FeatureConfig::new(20.0, 3).unwrap();
    let processor = FeatureProcessor::new(&log, &league, config);

    let features = processor.process_game(games.last().unwrap()).unwrap().features;

    assert!(features.get("player_3_per|season|raw|diff").is_some());
    assert!(features.get("player_4_per|season|raw|diff").is_none());
    assert_eq!(features.len(), 13 * 3);
}
