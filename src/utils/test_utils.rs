use crate::{
    database::db_structs::{BoxScoreStat, Game, StatLine},
    model::{league_constants::LeagueConstants, structures::position::Position}
};
use chrono::{Duration, NaiveDate};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ROSTER_POSITIONS: [Position; 10] = [
    Position::Guard,
    Position::Guard,
    Position::Forward,
    Position::Forward,
    Position::Center,
    Position::Guard,
    Position::Forward,
    Position::Center,
    Position::Guard,
    Position::Forward
];

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("Expected a valid calendar date")
}

/// A consistent stat line scaled linearly by minutes
pub fn generate_stat_line(minutes: f64) -> StatLine {
    StatLine {
        mp: minutes,
        fg: (minutes * 0.25).round(),
        fga: (minutes * 0.5).round(),
        three_p: (minutes * 0.05).round(),
        ft: (minutes * 0.1).round(),
        fta: (minutes * 0.13).round(),
        trb: (minutes * 0.2).round(),
        orb: (minutes * 0.05).round(),
        ast: (minutes * 0.12).round(),
        stl: (minutes * 0.03).round(),
        blk: (minutes * 0.02).round(),
        tov: (minutes * 0.06).round(),
        pf: (minutes * 0.07).round()
    }
}

pub fn generate_box_score(player_id: i32, game_id: i32, team_id: i32, game_date: NaiveDate, minutes: f64) -> BoxScoreStat {
    BoxScoreStat {
        player_id,
        game_id,
        game_date,
        team_id,
        position: None,
        starter: false,
        stats: generate_stat_line(minutes)
    }
}

pub fn generate_starter_box_score(
    player_id: i32,
    game_id: i32,
    team_id: i32,
    game_date: NaiveDate,
    minutes: f64,
    position: Position
) -> BoxScoreStat {
    BoxScoreStat {
        position: Some(position),
        starter: true,
        ..generate_box_score(player_id, game_id, team_id, game_date, minutes)
    }
}

pub fn generate_game(id: i32, season: i32, date: NaiveDate, home_team_id: i32, away_team_id: i32) -> Game {
    Game {
        id,
        league: "nba".to_string(),
        season,
        date,
        game_type: "regular".to_string(),
        home_team_id,
        away_team_id,
        home_injuries: vec![],
        away_injuries: vec![]
    }
}

/// Constants with hand-checkable values:
/// VOP = 109 / 101.68, DRB% = 34 / 44, factor = 2/3 - 0.3 / (80 / 17)
pub fn generate_league_constants() -> LeagueConstants {
    LeagueConstants {
        league: "nba".to_string(),
        season: 2024,
        team_games: 100,
        lg_ast: 24.0,
        lg_fg: 40.0,
        lg_ft: 17.0,
        lg_fta: 22.0,
        lg_pf: 20.0,
        lg_pts: 109.0,
        lg_fga: 88.0,
        lg_orb: 10.0,
        lg_tov: 14.0,
        lg_trb: 44.0,
        vop: 1.0719905586152636,
        drb_pct: 0.7727272727272727,
        factor: 0.6029166666666667,
        lg_pace: 100.0,
        lg_aper: 0.45
    }
}

fn random_stat_line(rng: &mut ChaCha8Rng, minutes: f64) -> StatLine {
    let mut scaled = |rate: f64| (minutes * rate * rng.random_range(0.6..1.4)).round();

    let fga = scaled(0.45);
    let fg = scaled(0.22).min(fga);
    let three_p = scaled(0.06).min(fg);
    let fta = scaled(0.15);
    let ft = scaled(0.11).min(fta);
    let trb = scaled(0.2);
    let orb = scaled(0.05).min(trb);

    StatLine {
        mp: minutes,
        fg,
        fga,
        three_p,
        ft,
        fta,
        trb,
        orb,
        ast: scaled(0.11),
        stl: scaled(0.03),
        blk: scaled(0.02),
        tov: scaled(0.06),
        pf: scaled(0.08)
    }
}

/// A seeded synthetic season. Teams `1..=n_teams` (even) play once per day,
/// paired at random. Each team has ten players with ids `team * 100 + k`;
/// the first five start. Deep bench players sometimes log zero minutes.
pub fn generate_season(seed: u64, n_teams: i32, n_days: i64, start: NaiveDate, season: i32) -> (Vec<Game>, Vec<BoxScoreStat>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut teams: Vec<i32> = (1..=n_teams).collect();
    let mut games = Vec::new();
    let mut box_scores = Vec::new();
    let mut game_id = 1;

    for day in 0..n_days {
        let game_date = start + Duration::days(day);
        teams.shuffle(&mut rng);

        for pair in teams.chunks(2) {
            let [home, away] = pair else {
                continue;
            };

            games.push(generate_game(game_id, season, game_date, *home, *away));

            for team_id in [*home, *away] {
                for (k, position) in ROSTER_POSITIONS.iter().enumerate() {
                    let minutes = match k {
                        0..=4 => rng.random_range(28.0..38.0),
                        5..=7 => rng.random_range(12.0..24.0),
                        _ => rng.random_range(0.0..8.0_f64).floor()
                    };

                    box_scores.push(BoxScoreStat {
                        player_id: team_id * 100 + k as i32,
                        game_id,
                        game_date,
                        team_id,
                        position: Some(*position),
                        starter: k < 5,
                        stats: random_stat_line(&mut rng, minutes)
                    });
                }
            }

            game_id += 1;
        }
    }

    (games, box_scores)
}
