use clap::Parser;
use hoops_processor::{
    args::Args,
    database::db::DbClient,
    model::{feature_model::FeatureProcessor, game_log::InMemoryGameLog}
};
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    init_tracing(&args.log_level);

    let (league, config) = match (args.league_config(), args.feature_config()) {
        (Ok(league), Ok(config)) => (league, config),
        (Err(e), _) | (_, Err(e)) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let client = match DbClient::connect(&args.connection_string).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            error!("Application cannot start without a valid database connection");
            std::process::exit(1);
        }
    };

    let log = match load_game_log(&client, &league.league, args.season).await {
        Ok(log) => log,
        Err(e) => {
            error!("Failed to load season {}: {}", args.season, e);
            std::process::exit(1);
        }
    };

    let processor = FeatureProcessor::new(&log, &league, config);
    if let Err(e) = processor.warm([args.season]) {
        error!("{}", e);
        std::process::exit(1);
    }

    let targets = log.target_games(&league.league, args.season, &league.exclude_game_types);
    let result = processor.process(&targets);

    if args.dry_run {
        info!("Dry run: skipping save of {} game features", result.features.len());
    } else if let Err(e) = client.save_features(&result.features).await {
        error!("Failed to save game features: {}", e);
        std::process::exit(1);
    }

    info!(
        "Processing complete: {} games with features, {} failed",
        result.features.len(),
        result.failures.len()
    );
}

fn init_tracing(log_level: &str) {
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

async fn load_game_log(client: &DbClient, league: &str, season: i32) -> hoops_processor::model::error::Result<InMemoryGameLog> {
    let games = client.get_games(league, season).await?;
    let box_scores = client.get_box_scores(league, season).await?;

    InMemoryGameLog::new(games, box_scores)
}
