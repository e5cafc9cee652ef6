use std::sync::Once;

use hoops_processor::{
    database::db_structs::Game,
    model::{
        config::{GameTypeFilter, LeagueConfig},
        game_log::InMemoryGameLog
    },
    utils::test_utils::{date, generate_season}
};

static INIT: Once = Once::new();

/// Installs a warn-level subscriber once per test binary
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
            .with_test_writer()
            .try_init();
    });
}

pub fn league() -> LeagueConfig {
    LeagueConfig::new("nba", GameTypeFilter::new(["preseason", "allstar"])).unwrap()
}

/// A seeded 2024 season: 8 teams playing daily for 30 days from Nov 1st
pub fn season_log(seed: u64) -> (Vec<Game>, InMemoryGameLog) {
    let (games, box_scores) = generate_season(seed, 8, 30, date(2023, 11, 1), 2024);
    let log = InMemoryGameLog::new(games.clone(), box_scores).unwrap();

    (games, log)
}
