use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use lighthouse_bot::{
    BotError, BotService, DEFAULT_WORKERS, HttpJoinClient, JOIN_TIMEOUT, JoinError,
    NewPlayer, RetryPolicy, RngDice, RpcServer, Shutdown, join_game,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_BOT_NAME: &str = "random-bot";
const DEFAULT_LOG_FILTER: &str = "lighthouse_bot=info";

#[derive(Parser, Debug)]
#[command(
    name = "lighthouse-bot",
    version,
    about = "Lighthouse game bot: joins a game master and answers its turns",
    long_about = None
)]
pub struct Cli {
    /// Bot name shown by the game master
    #[arg(long = "bn", default_value = DEFAULT_BOT_NAME, value_parser = NonEmptyStringValueParser::new())]
    pub bot_name: String,
    /// Address this bot listens on for game master calls (e.g. 127.0.0.1:3001)
    #[arg(long = "la", value_parser = NonEmptyStringValueParser::new())]
    pub listen_address: String,
    /// Game master address (e.g. 127.0.0.1:50051)
    #[arg(long = "gs", value_parser = NonEmptyStringValueParser::new())]
    pub game_server: String,
}

pub fn run() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = supervise(cli) {
        error!("{}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn supervise(cli: Cli) -> Result<(), BotError> {
    let shutdown = Shutdown::new();
    shutdown.install_signal_handler()?;

    let client = HttpJoinClient::new(&cli.game_server, JOIN_TIMEOUT)?;
    let player = NewPlayer {
        name: cli.bot_name,
        server_address: cli.listen_address.clone(),
    };
    info!("joining game at {} as {}", client.url(), player.name);

    let player_id = match join_game(&client, &player, RetryPolicy::default(), &shutdown) {
        Ok(id) => id,
        Err(JoinError::Cancelled) => {
            info!("interrupted before joining; exiting");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let server = RpcServer::bind(&cli.listen_address, DEFAULT_WORKERS)?;
    info!("starting to listen on {}", server.local_addr());

    let service = BotService::new(player_id, RngDice::from_entropy());
    server.serve(&service, &shutdown)?;

    if let Some(state) = service.stored_initial_state() {
        let (width, height) = state.map_size();
        info!("game on a {}x{} map with {} player(s)", width, height, state.player_count);
    }
    let (turns, last) = service.with_agent(|agent| (agent.history().len(), agent.last_action()));
    match last {
        Some(action) => info!("played {} turn(s); last action {}", turns, action),
        None => info!("no turns played"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bot_name_defaults() {
        let cli =
            Cli::try_parse_from(["lighthouse-bot", "--la", "0.0.0.0:3001", "--gs", "gm:50051"])
                .unwrap();
        assert_eq!(cli.bot_name, DEFAULT_BOT_NAME);
        assert_eq!(cli.listen_address, "0.0.0.0:3001");
        assert_eq!(cli.game_server, "gm:50051");
    }

    #[test]
    fn missing_or_empty_addresses_are_rejected() {
        assert!(Cli::try_parse_from(["lighthouse-bot", "--gs", "gm:50051"]).is_err());
        assert!(Cli::try_parse_from(["lighthouse-bot", "--la", "0.0.0.0:3001"]).is_err());
        assert!(
            Cli::try_parse_from(["lighthouse-bot", "--la", "", "--gs", "gm:50051"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["lighthouse-bot", "--bn", "", "--la", "a:1", "--gs", "b:2"])
                .is_err()
        );
    }
}
