use super::db_structs::{BoxScoreStat, Game, StatLine};
use crate::{
    model::{error::Result, feature_model::GameFeatures, structures::position::Position},
    utils::progress_utils::progress_bar
};
use postgres_types::ToSql;
use std::sync::Arc;
use tokio_postgres::{types::Json, Client, NoTls, Row};
use tracing::{error, info};

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    /// Every game of a league season, with the injury lists attached,
    /// ordered by date.
    pub async fn get_games(&self, league: &str, season: i32) -> Result<Vec<Game>> {
        info!("Fetching games for {} {}...", league, season);

        let rows = self
            .client
            .query(
                "
            SELECT
                g.id, g.league, g.season, g.game_date, g.game_type, g.home_team_id, g.away_team_id,
                COALESCE(array_agg(i.player_id ORDER BY i.player_id) FILTER (WHERE i.team_id = g.home_team_id), '{}'::int[]) AS home_injuries,
                COALESCE(array_agg(i.player_id ORDER BY i.player_id) FILTER (WHERE i.team_id = g.away_team_id), '{}'::int[]) AS away_injuries
            FROM games g
                     LEFT JOIN injuries i ON i.game_id = g.id
            WHERE g.league = $1 AND g.season = $2
            GROUP BY g.id
            ORDER BY g.game_date, g.id;",
                &[&league, &season]
            )
            .await?;

        let games: Vec<Game> = rows.iter().map(Self::game_from_row).collect();

        info!("Fetched {} games", games.len());
        Ok(games)
    }

    /// Every box-score row of a league season, ordered by date then game, team
    /// and player
    pub async fn get_box_scores(&self, league: &str, season: i32) -> Result<Vec<BoxScoreStat>> {
        info!("Fetching box scores for {} {}...", league, season);

        let rows = self
            .client
            .query(
                "
            SELECT
                b.player_id, b.game_id, g.game_date, b.team_id, b.position, b.starter,
                b.mp, b.fg, b.fga, b.three_p, b.ft, b.fta, b.trb, b.orb, b.ast, b.stl, b.blk, b.tov, b.pf
            FROM box_scores b
                     JOIN games g ON g.id = b.game_id
            WHERE g.league = $1 AND g.season = $2
            ORDER BY g.game_date, b.game_id, b.team_id, b.player_id;",
                &[&league, &season]
            )
            .await?;

        let box_scores: Vec<BoxScoreStat> = rows.iter().map(Self::box_score_from_row).collect();

        info!("Fetched {} box scores", box_scores.len());
        Ok(box_scores)
    }

    fn game_from_row(row: &Row) -> Game {
        Game {
            id: row.get("id"),
            league: row.get("league"),
            season: row.get("season"),
            date: row.get("game_date"),
            game_type: row.get("game_type"),
            home_team_id: row.get("home_team_id"),
            away_team_id: row.get("away_team_id"),
            home_injuries: row.get("home_injuries"),
            away_injuries: row.get("away_injuries")
        }
    }

    fn box_score_from_row(row: &Row) -> BoxScoreStat {
        // Unrecognized positions are treated as unlisted
        let position = row
            .get::<_, Option<String>>("position")
            .and_then(|p| Position::try_from(p.as_str()).ok());

        BoxScoreStat {
            player_id: row.get("player_id"),
            game_id: row.get("game_id"),
            game_date: row.get("game_date"),
            team_id: row.get("team_id"),
            position,
            starter: row.get("starter"),
            stats: StatLine {
                mp: row.get("mp"),
                fg: row.get("fg"),
                fga: row.get("fga"),
                three_p: row.get("three_p"),
                ft: row.get("ft"),
                fta: row.get("fta"),
                trb: row.get("trb"),
                orb: row.get("orb"),
                ast: row.get("ast"),
                stl: row.get("stl"),
                blk: row.get("blk"),
                tov: row.get("tov"),
                pf: row.get("pf")
            }
        }
    }

    /// Upserts one row per game into `game_features`, replacing any
    /// previously generated features for that game
    pub async fn save_features(&self, features: &[GameFeatures]) -> Result<()> {
        if features.is_empty() {
            info!("No game features to save");
            return Ok(());
        }

        let statement = self
            .client
            .prepare(
                "INSERT INTO game_features (game_id, game_date, home_team_id, away_team_id, features) \
                VALUES ($1, $2, $3, $4, $5) \
                ON CONFLICT (game_id) DO UPDATE SET \
                game_date = EXCLUDED.game_date, home_team_id = EXCLUDED.home_team_id, \
                away_team_id = EXCLUDED.away_team_id, features = EXCLUDED.features"
            )
            .await?;

        let p_bar = progress_bar(features.len() as u64, "Saving game features to db".to_string());

        for game in features {
            let json = Json(&game.features);
            let values: &[&(dyn ToSql + Sync)] = &[
                &game.game_id,
                &game.date,
                &game.home_team_id,
                &game.away_team_id,
                &json
            ];

            self.client.execute(&statement, values).await?;
            p_bar.inc(1);
        }

        p_bar.finish();

        info!("Saved features for {} games", features.len());
        Ok(())
    }
}
