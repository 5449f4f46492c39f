use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::modules::error::JoinError;
use crate::modules::shutdown::Shutdown;
use crate::modules::wire::{JOIN, NewPlayer, PlayerIdReply};
use crate::modules::world::PlayerId;

/// Per-attempt deadline for the outbound Join call.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(1);
/// Pause between failed Join attempts.
pub const JOIN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Anything that can carry a Join request to the game master.
pub trait JoinTransport {
    fn join(&self, player: &NewPlayer) -> Result<PlayerId, JoinError>;
}

#[derive(Debug, Clone)]
pub struct HttpJoinClient {
    url: String,
    http: Client,
}

impl HttpJoinClient {
    pub fn new(game_server: &str, timeout: Duration) -> Result<Self, JoinError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: format!("{}{}", base_url(game_server), JOIN),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl JoinTransport for HttpJoinClient {
    fn join(&self, player: &NewPlayer) -> Result<PlayerId, JoinError> {
        let resp = self.http.post(&self.url).json(player).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(JoinError::Rejected(status.as_u16()));
        }
        let reply: PlayerIdReply = resp.json()?;
        Ok(reply.player_id)
    }
}

fn base_url(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// `None` retries until joined or cancelled.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: JOIN_RETRY_DELAY,
            max_attempts: None,
        }
    }
}

/// Register with the game master, retrying with a fixed delay.
pub fn join_game<T: JoinTransport + ?Sized>(
    transport: &T,
    player: &NewPlayer,
    policy: RetryPolicy,
    shutdown: &Shutdown,
) -> Result<PlayerId, JoinError> {
    join_game_with(transport, player, policy, shutdown, thread::sleep)
}

pub fn join_game_with<T, S>(
    transport: &T,
    player: &NewPlayer,
    policy: RetryPolicy,
    shutdown: &Shutdown,
    mut sleep: S,
) -> Result<PlayerId, JoinError>
where
    T: JoinTransport + ?Sized,
    S: FnMut(Duration),
{
    let mut attempts = 0u32;
    loop {
        if shutdown.is_triggered() {
            return Err(JoinError::Cancelled);
        }

        attempts += 1;
        match transport.join(player) {
            Ok(player_id) => {
                info!("joined game with id {}", player_id);
                debug!(?player, attempts, "join accepted");
                return Ok(player_id);
            }
            Err(err) => {
                warn!("could not join game: {}", err);
                if policy.max_attempts.is_some_and(|max| attempts >= max) {
                    return Err(JoinError::Exhausted {
                        attempts,
                        last: err.to_string(),
                    });
                }
            }
        }

        sleep(policy.delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Fails the first `failures` calls, then hands out `player_id`.
    struct FlakyTransport {
        failures: u32,
        player_id: PlayerId,
        calls: Cell<u32>,
        seen: RefCell<Vec<NewPlayer>>,
    }

    impl FlakyTransport {
        fn new(failures: u32, player_id: PlayerId) -> Self {
            Self {
                failures,
                player_id,
                calls: Cell::new(0),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl JoinTransport for FlakyTransport {
        fn join(&self, player: &NewPlayer) -> Result<PlayerId, JoinError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            self.seen.borrow_mut().push(player.clone());
            if call <= self.failures {
                Err(JoinError::Rejected(503))
            } else {
                Ok(self.player_id + call as PlayerId)
            }
        }
    }

    fn player() -> NewPlayer {
        NewPlayer {
            name: "random-bot".into(),
            server_address: "127.0.0.1:3001".into(),
        }
    }

    #[test]
    fn retries_until_third_attempt_succeeds() {
        let transport = FlakyTransport::new(2, 10);
        let mut sleeps = Vec::new();

        let id = join_game_with(
            &transport,
            &player(),
            RetryPolicy::default(),
            &Shutdown::new(),
            |d| sleeps.push(d),
        )
        .unwrap();

        assert_eq!(transport.calls.get(), 3);
        assert_eq!(id, 13);
        assert_eq!(sleeps, vec![JOIN_RETRY_DELAY, JOIN_RETRY_DELAY]);
        assert!(transport.seen.borrow().iter().all(|p| *p == player()));
    }

    #[test]
    fn first_success_does_not_sleep() {
        let transport = FlakyTransport::new(0, 0);
        let mut slept = 0;
        let id = join_game_with(
            &transport,
            &player(),
            RetryPolicy::default(),
            &Shutdown::new(),
            |_| slept += 1,
        )
        .unwrap();
        assert_eq!(id, 1);
        assert_eq!(slept, 0);
    }

    #[test]
    fn capped_policy_gives_up() {
        let transport = FlakyTransport::new(10, 0);
        let policy = RetryPolicy {
            delay: Duration::ZERO,
            max_attempts: Some(4),
        };
        let mut slept = 0;

        let err = join_game_with(&transport, &player(), policy, &Shutdown::new(), |_| slept += 1)
            .unwrap_err();

        assert!(matches!(err, JoinError::Exhausted { attempts: 4, .. }));
        assert_eq!(transport.calls.get(), 4);
        assert_eq!(slept, 3);
    }

    #[test]
    fn shutdown_cancels_between_attempts() {
        let transport = FlakyTransport::new(u32::MAX, 0);
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();

        let err = join_game_with(
            &transport,
            &player(),
            RetryPolicy::default(),
            &shutdown,
            |_| trigger.trigger(),
        )
        .unwrap_err();

        assert!(matches!(err, JoinError::Cancelled));
        assert_eq!(transport.calls.get(), 1);
    }

    #[test]
    fn base_url_adds_missing_scheme() {
        assert_eq!(base_url("localhost:50051"), "http://localhost:50051");
        assert_eq!(base_url("https://gm.example/"), "https://gm.example");

        let client = HttpJoinClient::new("127.0.0.1:9", JOIN_TIMEOUT).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:9/GameService/Join");
    }
}
