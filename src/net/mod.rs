//! Transport client: a reconnecting WebSocket on a worker thread.
//!
//! The worker owns the socket; the frame loop talks to it over channels so
//! every piece of scene state stays on one logical thread. Recovery is
//! reconnect-by-reload: a closed socket tears the whole session down and
//! restarts it after a fixed delay, with exactly one restart pending at
//! a time.

mod diagnostics;
mod protocol;

pub use diagnostics::{ThroughputMeter, ThroughputSample};
pub use protocol::{classify_text, socket_endpoint, ClientMessage, InboundText, RosterMessage};

use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::params::NetConfig;
use crate::presence::Participant;

/// Connection lifecycle. `Closed` always leads back to `Connecting` through
/// the reload scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Inbound events surfaced to the frame loop, drained at frame boundaries
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Opened,
    /// Parsed roster update (application is the caller's decision)
    Roster(Vec<Participant>),
    /// Binary payload: byte length plus the worker-side arrival time, so
    /// throughput is measured at arrival even when the frame loop drains a
    /// batch of these in one go
    Binary { bytes: usize, arrived: Instant },
    /// Free-form text, for the diagnostic log
    Text(String),
    Closed,
}

/// Single-shot restart timer. Duplicate close events while a restart is
/// pending must not schedule a second one.
pub struct ReloadScheduler {
    delay: Duration,
    due_at: Option<Instant>,
}

impl ReloadScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            due_at: None,
        }
    }

    /// Arm the timer. Returns false if a restart is already pending.
    pub fn schedule_at(&mut self, now: Instant) -> bool {
        if self.due_at.is_some() {
            return false;
        }
        self.due_at = Some(now + self.delay);
        true
    }

    /// Whether the pending restart should fire
    pub fn is_due(&self, now: Instant) -> bool {
        self.due_at.is_some_and(|due| now >= due)
    }

    pub fn is_pending(&self) -> bool {
        self.due_at.is_some()
    }

    /// Disarm after the restart has happened
    pub fn reset(&mut self) {
        self.due_at = None;
    }
}

/// Handle owned by the frame loop. Dropping it ends the worker on its next
/// channel operation.
pub struct TransportClient {
    inbound: Receiver<InboundEvent>,
    outbound: Sender<ClientMessage>,
    state: Arc<Mutex<ConnectionState>>,
}

impl TransportClient {
    /// Spawn the worker and start connecting to the configured origin
    pub fn connect(config: NetConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel();
        let (outbound_tx, outbound_rx) = mpsc::channel();
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));

        let worker_state = Arc::clone(&state);
        thread::Builder::new()
            .name("transport".into())
            .spawn(move || run_worker(config, worker_state, inbound_tx, outbound_rx))
            .expect("failed to spawn transport thread");

        Self {
            inbound: inbound_rx,
            outbound: outbound_tx,
            state,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    /// Queue pointer telemetry. Silently dropped unless the connection is
    /// open: telemetry is best-effort, there is no backpressure.
    pub fn send_pointer(&self, x: f32, y: f32) {
        if self.state() != ConnectionState::Open {
            return;
        }
        let _ = self.outbound.send(ClientMessage::Pointermove { x, y });
    }

    /// Drain everything that arrived since the last frame
    pub fn poll(&self) -> Vec<InboundEvent> {
        let mut events = Vec::new();
        loop {
            match self.inbound.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Worker loop: connect, pump the session, and on any close schedule one
/// full restart after the configured delay.
fn run_worker(
    config: NetConfig,
    state: Arc<Mutex<ConnectionState>>,
    inbound: Sender<InboundEvent>,
    outbound: Receiver<ClientMessage>,
) {
    let endpoint = socket_endpoint(&config.origin);
    let mut reload = ReloadScheduler::new(Duration::from_millis(config.reload_delay_ms));

    loop {
        *state.lock().unwrap() = ConnectionState::Connecting;
        tracing::info!(%endpoint, "connecting");

        match tungstenite::connect(&endpoint) {
            Ok((mut socket, _response)) => {
                if let Err(e) = set_nonblocking(&mut socket) {
                    tracing::warn!(%e, "could not switch socket to non-blocking mode");
                }
                *state.lock().unwrap() = ConnectionState::Open;
                tracing::info!(%endpoint, "websocket connected");
                if inbound.send(InboundEvent::Opened).is_err() {
                    return; // frame loop is gone
                }

                run_session(&mut socket, &inbound, &outbound, &config);
            }
            Err(e) => {
                tracing::warn!(%e, "connection failed");
            }
        }

        *state.lock().unwrap() = ConnectionState::Closed;
        tracing::info!(%endpoint, "websocket disconnected");
        if inbound.send(InboundEvent::Closed).is_err() {
            return;
        }

        // Reconnect-by-reload: one pending restart, fixed delay, no backoff
        if reload.schedule_at(Instant::now()) {
            tracing::info!(delay_ms = config.reload_delay_ms, "restart scheduled");
        }
        while !reload.is_due(Instant::now()) {
            thread::sleep(Duration::from_millis(20));
        }
        reload.reset();

        // Telemetry queued against the dead session is stale; drop it
        while outbound.try_recv().is_ok() {}
    }
}

/// Pump one open session until the socket errors or closes
fn run_session(
    socket: &mut Socket,
    inbound: &Sender<InboundEvent>,
    outbound: &Receiver<ClientMessage>,
    config: &NetConfig,
) {
    loop {
        // Drain everything readable right now
        loop {
            match socket.read() {
                Ok(Message::Binary(payload)) => {
                    let event = InboundEvent::Binary {
                        bytes: payload.len(),
                        arrived: Instant::now(),
                    };
                    if inbound.send(event).is_err() {
                        return;
                    }
                }
                Ok(Message::Text(text)) => {
                    let event = match classify_text(&text) {
                        InboundText::Roster(clients) => InboundEvent::Roster(clients),
                        InboundText::Malformed => {
                            tracing::warn!(payload = %text, "unparseable structured message");
                            continue;
                        }
                        InboundText::Plain => InboundEvent::Text(text),
                    };
                    if inbound.send(event).is_err() {
                        return;
                    }
                }
                Ok(Message::Close(_)) => return,
                Ok(_) => {} // ping/pong handled by tungstenite
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    break
                }
                Err(e) => {
                    tracing::warn!(%e, "socket read failed");
                    return;
                }
            }
        }

        // Flush queued pointer telemetry
        while let Ok(msg) = outbound.try_recv() {
            let Ok(json) = serde_json::to_string(&msg) else {
                continue;
            };
            if let Err(e) = socket.send(Message::Text(json)) {
                tracing::warn!(%e, "socket send failed");
                return;
            }
        }

        thread::sleep(Duration::from_millis(config.poll_interval_ms));
    }
}

fn set_nonblocking(socket: &mut Socket) -> std::io::Result<()> {
    match socket.get_mut() {
        MaybeTlsStream::Plain(stream) => stream.set_nonblocking(true),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_scheduler_is_single_shot() {
        let mut reload = ReloadScheduler::new(Duration::from_millis(2000));
        let t0 = Instant::now();

        assert!(reload.schedule_at(t0));
        // A burst of close events inside the window arms nothing new
        assert!(!reload.schedule_at(t0 + Duration::from_millis(10)));
        assert!(!reload.schedule_at(t0 + Duration::from_millis(500)));
        assert!(reload.is_pending());
    }

    #[test]
    fn test_reload_fires_after_fixed_delay() {
        let mut reload = ReloadScheduler::new(Duration::from_millis(2000));
        let t0 = Instant::now();
        reload.schedule_at(t0);

        assert!(!reload.is_due(t0));
        assert!(!reload.is_due(t0 + Duration::from_millis(1999)));
        assert!(reload.is_due(t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn test_reload_rearms_after_reset() {
        let mut reload = ReloadScheduler::new(Duration::from_millis(2000));
        let t0 = Instant::now();

        reload.schedule_at(t0);
        reload.reset();
        assert!(!reload.is_pending());
        assert!(reload.schedule_at(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn test_pointer_telemetry_dropped_unless_open() {
        let (inbound_tx, inbound_rx) = mpsc::channel();
        let (outbound_tx, outbound_rx) = mpsc::channel();
        drop(inbound_tx);

        let client = TransportClient {
            inbound: inbound_rx,
            outbound: outbound_tx,
            state: Arc::new(Mutex::new(ConnectionState::Connecting)),
        };

        client.send_pointer(0.5, 0.5);
        assert!(matches!(outbound_rx.try_recv(), Err(TryRecvError::Empty)));

        *client.state.lock().unwrap() = ConnectionState::Open;
        client.send_pointer(0.25, 0.75);
        assert_eq!(
            outbound_rx.try_recv().unwrap(),
            ClientMessage::Pointermove { x: 0.25, y: 0.75 }
        );

        *client.state.lock().unwrap() = ConnectionState::Closed;
        client.send_pointer(0.1, 0.1);
        assert!(matches!(outbound_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_poll_drains_in_order() {
        let (inbound_tx, inbound_rx) = mpsc::channel();
        let (outbound_tx, _outbound_rx) = mpsc::channel();

        let arrived = Instant::now();
        inbound_tx.send(InboundEvent::Opened).unwrap();
        inbound_tx
            .send(InboundEvent::Binary {
                bytes: 512,
                arrived,
            })
            .unwrap();
        inbound_tx
            .send(InboundEvent::Text("boo!".to_string()))
            .unwrap();

        let client = TransportClient {
            inbound: inbound_rx,
            outbound: outbound_tx,
            state: Arc::new(Mutex::new(ConnectionState::Open)),
        };

        let events = client.poll();
        assert_eq!(
            events,
            vec![
                InboundEvent::Opened,
                InboundEvent::Binary {
                    bytes: 512,
                    arrived,
                },
                InboundEvent::Text("boo!".to_string()),
            ]
        );
        assert!(client.poll().is_empty());
    }

    #[test]
    fn test_batched_binary_events_keep_arrival_timing() {
        // Two payloads arriving 50 ms apart but drained in the same frame
        // must still read as 20 per second, not as a microsecond gap
        let t0 = Instant::now();
        let events = vec![
            InboundEvent::Binary {
                bytes: 65536,
                arrived: t0,
            },
            InboundEvent::Binary {
                bytes: 65536,
                arrived: t0 + Duration::from_millis(50),
            },
        ];

        let mut meter = ThroughputMeter::new();
        let mut last = None;
        for event in events {
            if let InboundEvent::Binary { bytes, arrived } = event {
                last = Some(meter.record_at(bytes, arrived));
            }
        }
        assert_eq!(last.unwrap().fps, 20);
    }
}
