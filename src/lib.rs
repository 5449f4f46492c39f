pub mod modules;

pub use modules::agent::{Agent, TurnRecord};
pub use modules::engine::{
    ATTACK_CHANCE_PERCENT, Dice, OWNERSHIP_THRESHOLD, RngDice, best_unowned, capture_ratio,
    connection_candidates, decide_action, movement_target, step_toward,
};
pub use modules::error::{BotError, JoinError, RpcError};
pub use modules::join::{
    HttpJoinClient, JOIN_RETRY_DELAY, JOIN_TIMEOUT, JoinTransport, RetryPolicy, join_game,
    join_game_with,
};
pub use modules::server::{DEFAULT_WORKERS, POLL_INTERVAL, RpcServer, dispatch, intercept};
pub use modules::service::{BotService, GameService, Phase};
pub use modules::shutdown::Shutdown;
pub use modules::wire::{
    self, Action, ActionKind, NewAction, NewPlayer, PlayerIdReply, PlayerReady,
};
pub use modules::world::{
    Direction, Energy, InitialState, Lighthouse, MapRow, PlayerId, Position, TurnSnapshot,
    UNOWNED,
};
