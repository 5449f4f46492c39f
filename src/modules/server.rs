use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

use crate::modules::error::{BotError, RpcError};
use crate::modules::service::GameService;
use crate::modules::shutdown::Shutdown;
use crate::modules::wire::{INITIAL_STATE, JOIN, SERVICE, TURN};

/// Worker threads serving inbound calls.
pub const DEFAULT_WORKERS: usize = 10;
/// How often an idle worker checks for shutdown.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// JSON-over-HTTP endpoint for a `GameService`.
pub struct RpcServer {
    http: Server,
    local_addr: SocketAddr,
    workers: usize,
}

impl RpcServer {
    pub fn bind(address: &str, workers: usize) -> Result<Self, BotError> {
        let listener = TcpListener::bind(address).map_err(|source| BotError::Bind {
            address: address.to_string(),
            source,
        })?;
        let local_addr = listener.local_addr()?;
        let http = Server::from_listener(listener, None)
            .map_err(|e| BotError::Server(e.to_string()))?;
        Ok(Self {
            http,
            local_addr,
            workers: workers.max(1),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` fires. In-flight calls finish; queued ones are dropped.
    ///
    /// A worker that cannot accept connections stops the whole server, and its
    /// error is returned.
    pub fn serve<S: GameService + ?Sized>(
        &self,
        service: &S,
        shutdown: &Shutdown,
    ) -> Result<(), BotError> {
        info!(
            "serving {} on {} with {} worker(s)",
            SERVICE, self.local_addr, self.workers
        );
        let outcome = thread::scope(|scope| {
            let mut workers = Vec::with_capacity(self.workers);
            let mut failure = None;
            for id in 0..self.workers {
                let spawned = thread::Builder::new()
                    .name(format!("rpc-worker-{}", id))
                    .spawn_scoped(scope, || self.worker_loop(service, shutdown));
                match spawned {
                    Ok(worker) => workers.push(worker),
                    Err(err) => {
                        failure = Some(BotError::Server(format!(
                            "failed to start worker {}: {}",
                            id, err
                        )));
                        shutdown.trigger();
                        break;
                    }
                }
            }
            for worker in workers {
                let result = worker
                    .join()
                    .unwrap_or_else(|_| Err(BotError::Server("worker panicked".to_string())));
                if let Err(err) = result {
                    failure.get_or_insert(err);
                }
            }
            failure.map_or(Ok(()), Err)
        });
        match &outcome {
            Ok(()) => info!("server on {} stopped", self.local_addr),
            Err(err) => error!("server on {} failed: {}", self.local_addr, err),
        }
        outcome
    }

    fn worker_loop<S: GameService + ?Sized>(
        &self,
        service: &S,
        shutdown: &Shutdown,
    ) -> Result<(), BotError> {
        while !shutdown.is_triggered() {
            match self.http.recv_timeout(POLL_INTERVAL) {
                Ok(Some(request)) => {
                    let call = AssertUnwindSafe(|| handle(service, request));
                    if panic::catch_unwind(call).is_err() {
                        // Dropped unanswered; this worker keeps serving.
                        error!("call handler panicked; connection closed");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    shutdown.trigger();
                    return Err(accept_failed(err));
                }
            }
        }
        Ok(())
    }
}

fn accept_failed(err: std::io::Error) -> BotError {
    BotError::Server(format!("accept failed: {}", err))
}

fn handle<S: GameService + ?Sized>(service: &S, mut request: Request) {
    let method = request.url().to_string();
    let result = intercept(&method, || {
        if *request.method() != Method::Post {
            return Err(RpcError::MethodNotAllowed(method.clone()));
        }
        let mut body = Vec::new();
        request.as_reader().read_to_end(&mut body)?;
        dispatch(service, &method, &body)
    });

    let response = match result {
        Ok(bytes) => json_response(bytes, 200),
        Err(err) => {
            warn!("call {} failed: {}", method, err);
            Response::from_string(err.to_string()).with_status_code(StatusCode(err.status_code()))
        }
    };
    if let Err(err) = request.respond(response) {
        warn!("failed to reply to {}: {}", method, err);
    }
}

fn json_response(bytes: Vec<u8>, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_data(bytes).with_status_code(StatusCode(status));
    match Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

/// Times one inbound call, whatever its method or outcome.
pub fn intercept<T>(method: &str, call: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = call();
    let duration_ns = start.elapsed().as_nanos();
    info!("unary call: {}, duration: {} ns", method, duration_ns);
    out
}

/// Route a raw call to the matching `GameService` operation.
pub fn dispatch<S: GameService + ?Sized>(
    service: &S,
    method: &str,
    body: &[u8],
) -> Result<Vec<u8>, RpcError> {
    match method {
        JOIN => {
            let request = decode(method_name(JOIN), body)?;
            encode(method_name(JOIN), &service.join(request))
        }
        INITIAL_STATE => {
            let state = decode(method_name(INITIAL_STATE), body)?;
            encode(method_name(INITIAL_STATE), &service.initial_state(state))
        }
        TURN => {
            let snapshot = decode(method_name(TURN), body)?;
            encode(method_name(TURN), &service.turn(snapshot))
        }
        other => Err(RpcError::UnknownMethod(other.to_string())),
    }
}

fn method_name(path: &'static str) -> &'static str {
    path.rsplit('/').next().unwrap_or(path)
}

fn decode<T: DeserializeOwned>(method: &'static str, body: &[u8]) -> Result<T, RpcError> {
    serde_json::from_slice(body).map_err(|source| RpcError::Decode { method, source })
}

fn encode<T: Serialize>(method: &'static str, reply: &T) -> Result<Vec<u8>, RpcError> {
    let bytes = serde_json::to_vec(reply).map_err(|source| RpcError::Encode { method, source })?;
    debug!("{} reply: {}", method, String::from_utf8_lossy(&bytes));
    Ok(bytes)
}
