//! The authority process: accepts connections, dispatches protocol
//! messages, and owns every board.
//!
//! All mutable state lives behind one `std::sync::Mutex`, locked per
//! inbound message and never held across an `.await`; that lock is the
//! serialization point the pairing and move-resolution rules require.
//! Outbound messages go through per-player unbounded channels drained by
//! writer tasks, so dispatch never waits on a slow peer's socket.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::common::{GameError, PlayerId, SessionId, ShotOutcome};
use crate::fleet::random_fleet;
use crate::matchmaker::{Matchmaker, Pair};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{Seat, Session};
use crate::transport::{read_frame, write_frame};

struct PlayerEntry {
    name: String,
    tx: UnboundedSender<ServerMessage>,
    session: Option<SessionId>,
}

struct SessionEntry {
    session: Session,
    lobby_code: Option<String>,
}

struct ServerState {
    players: HashMap<PlayerId, PlayerEntry>,
    matchmaker: Matchmaker,
    sessions: HashMap<SessionId, SessionEntry>,
    rng: SmallRng,
    next_player: u64,
    next_session: u64,
}

impl ServerState {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Self {
            players: HashMap::new(),
            matchmaker: Matchmaker::new(),
            sessions: HashMap::new(),
            rng,
            next_player: 0,
            next_session: 0,
        }
    }

    fn send_to(&self, player: PlayerId, msg: ServerMessage) {
        if let Some(entry) = self.players.get(&player) {
            // A failed send means the writer task is gone; the read loop's
            // teardown handles the rest.
            let _ = entry.tx.send(msg);
        }
    }

    fn name_of(&self, player: PlayerId) -> &str {
        self.players
            .get(&player)
            .map(|e| e.name.as_str())
            .unwrap_or("Anonymous")
    }

    fn set_name(&mut self, player: PlayerId, username: &str) {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return;
        }
        if let Some(entry) = self.players.get_mut(&player) {
            entry.name = trimmed.to_string();
        }
    }
}

/// Run the authority on an already-bound listener until the task is
/// dropped. Tests bind `127.0.0.1:0` and pass the listener in; a fixed
/// `seed` reproduces every dealt fleet and lobby code in order.
pub async fn run(listener: TcpListener, seed: Option<u64>) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("listening on {}", addr);
    }
    let state = Arc::new(Mutex::new(ServerState::new(seed)));
    loop {
        let (stream, addr) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(state, stream).await {
                log::debug!("connection {} ended: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(
    state: Arc<Mutex<ServerState>>,
    stream: TcpStream,
) -> anyhow::Result<()> {
    let (mut reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();

    let player = {
        let mut st = state.lock().unwrap();
        st.next_player += 1;
        let player = PlayerId(st.next_player);
        st.players.insert(
            player,
            PlayerEntry {
                name: "Anonymous".to_string(),
                tx,
                session: None,
            },
        );
        log::info!(
            "player {:?} connected ({} online, {} sessions)",
            player,
            st.players.len(),
            st.sessions.len()
        );
        player
    };

    tokio::spawn(write_loop(rx, writer));

    let result = loop {
        match read_frame::<_, ClientMessage>(&mut reader).await {
            Ok(msg) => {
                let mut st = state.lock().unwrap();
                dispatch(&mut st, player, msg);
            }
            Err(e) => break e,
        }
    };

    let mut st = state.lock().unwrap();
    disconnect(&mut st, player);
    Err(result)
}

async fn write_loop(mut rx: UnboundedReceiver<ServerMessage>, mut writer: OwnedWriteHalf) {
    while let Some(msg) = rx.recv().await {
        if write_frame(&mut writer, &msg).await.is_err() {
            break;
        }
    }
}

fn dispatch(st: &mut ServerState, player: PlayerId, msg: ClientMessage) {
    match msg {
        ClientMessage::RegisterPlayer { username } => {
            st.set_name(player, &username);
            st.send_to(player, ServerMessage::MainMenu);
        }
        ClientMessage::FindGame { username } => {
            st.set_name(player, &username);
            match st.matchmaker.enqueue(player) {
                Ok(Some(pair)) => start_session(st, pair),
                Ok(None) => st.send_to(
                    player,
                    ServerMessage::FindingGame {
                        message: "Waiting for an opponent...".to_string(),
                    },
                ),
                Err(e) => send_error(st, player, e),
            }
        }
        ClientMessage::CancelFindGame => {
            st.matchmaker.cancel(player);
            st.send_to(player, ServerMessage::MainMenu);
        }
        ClientMessage::CreatePrivateLobby => {
            match st.matchmaker.create_lobby(player, &mut st.rng) {
                Ok(room_code) => {
                    st.send_to(player, ServerMessage::PrivateLobbyCreated { room_code })
                }
                Err(e) => send_error(st, player, e),
            }
        }
        ClientMessage::JoinPrivateLobby {
            room_code,
            username,
        } => {
            st.set_name(player, &username);
            match st.matchmaker.join_lobby(&room_code, player) {
                Ok(pair) => start_session(st, pair),
                Err(e) => send_error(st, player, e),
            }
        }
        ClientMessage::MakeMove { room_id, row, col } => {
            handle_move(st, player, room_id, row as usize, col as usize);
        }
    }
}

fn send_error(st: &ServerState, player: PlayerId, e: GameError) {
    st.send_to(
        player,
        ServerMessage::Error {
            message: e.to_string(),
        },
    );
}

/// Deal both fleets, build the session, and send both `game_started`
/// views. Fleets come off the server rng seat A first, so a seeded server
/// deals reproducibly.
fn start_session(st: &mut ServerState, pair: Pair) {
    st.next_session += 1;
    let room_id = SessionId(st.next_session);
    let mut session = Session::new(
        room_id,
        (pair.first, st.name_of(pair.first).to_string()),
        (pair.second, st.name_of(pair.second).to_string()),
    );
    for seat in [Seat::A, Seat::B] {
        let fleet = random_fleet(&mut st.rng);
        session
            .place_fleet(seat, &fleet)
            .expect("generated fleet failed validation");
    }
    log::info!(
        "session {:?} started: {} vs {}",
        room_id,
        session.name(Seat::A),
        session.name(Seat::B)
    );
    for seat in [Seat::A, Seat::B] {
        let view = session.view(seat);
        st.send_to(
            session.player(seat),
            ServerMessage::GameStarted {
                room_id,
                my_board: view.my_board,
                opponent_view_board: view.opponent_view_board,
                is_my_turn: view.is_my_turn,
                opponent_name: session.name(seat.other()).to_string(),
            },
        );
    }
    for seat in [Seat::A, Seat::B] {
        if let Some(entry) = st.players.get_mut(&session.player(seat)) {
            entry.session = Some(room_id);
        }
    }
    st.sessions.insert(
        room_id,
        SessionEntry {
            session,
            lobby_code: pair.lobby_code,
        },
    );
}

fn coord_label(row: usize, col: usize) -> String {
    format!("{}{}", (b'A' + col as u8) as char, row)
}

fn handle_move(st: &mut ServerState, player: PlayerId, room_id: SessionId, row: usize, col: usize) {
    // The room lookup and the turn check are one guard: a move against an
    // unknown or foreign room is rejected without touching any session.
    let actor = match st
        .sessions
        .get(&room_id)
        .and_then(|entry| entry.session.seat_of(player))
    {
        Some(seat) => seat,
        None => return send_error(st, player, GameError::NotYourTurn),
    };
    let result = match st.sessions.get_mut(&room_id) {
        Some(entry) => entry.session.resolve_move(actor, row, col),
        None => return,
    };
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return send_error(st, player, e),
    };

    if let Some(winner) = outcome.winner {
        finish_session(st, room_id, winner);
        return;
    }

    let session = match st.sessions.get(&room_id) {
        Some(entry) => &entry.session,
        None => return,
    };
    let verdict = match outcome.shot {
        ShotOutcome::Hit => "hit",
        ShotOutcome::Miss => "miss",
    };
    let cell = coord_label(row, col);
    for seat in [Seat::A, Seat::B] {
        let view = session.view(seat);
        let message = if seat == actor {
            format!("You fired at {}: {}.", cell, verdict)
        } else {
            format!("{} fired at {}: {}.", session.name(actor), cell, verdict)
        };
        st.send_to(
            session.player(seat),
            ServerMessage::UpdateGameState {
                my_board: view.my_board,
                opponent_view_board: view.opponent_view_board,
                is_my_turn: view.is_my_turn,
                message,
            },
        );
    }
}

/// Emit `game_over` with the full reveal to both sides and tear the
/// session down, releasing both players back to matchmaking.
fn finish_session(st: &mut ServerState, room_id: SessionId, winner: Seat) {
    let entry = match st.sessions.remove(&room_id) {
        Some(entry) => entry,
        None => return,
    };
    let session = entry.session;
    let winner_name = session.name(winner).to_string();
    log::info!("session {:?} over: {} won", room_id, winner_name);
    for seat in [Seat::A, Seat::B] {
        st.send_to(
            session.player(seat),
            ServerMessage::GameOver {
                winner_name: winner_name.clone(),
                opponent_board: session.reveal_opponent(seat),
            },
        );
    }
    for player in session.players() {
        if let Some(p) = st.players.get_mut(&player) {
            p.session = None;
        }
    }
    st.matchmaker
        .release(session.players(), entry.lobby_code.as_deref());
}

/// Connection teardown: forget the player's waiting state, abandon any
/// active session (notifying the survivor), and drop the player entry,
/// which closes the writer task's channel.
fn disconnect(st: &mut ServerState, player: PlayerId) {
    st.matchmaker.remove(player);
    let session_id = st.players.get(&player).and_then(|e| e.session);
    if let Some(room_id) = session_id {
        if let Some(mut entry) = st.sessions.remove(&room_id) {
            let leaver = entry
                .session
                .seat_of(player)
                .expect("session recorded for a non-participant");
            entry.session.abandon(leaver);
            let survivor = entry.session.player(leaver.other());
            log::info!(
                "session {:?} abandoned by {}",
                room_id,
                entry.session.name(leaver)
            );
            st.send_to(
                survivor,
                ServerMessage::OpponentDisconnected {
                    message: format!("{} disconnected.", entry.session.name(leaver)),
                },
            );
            if let Some(p) = st.players.get_mut(&survivor) {
                p.session = None;
            }
            st.matchmaker
                .release(entry.session.players(), entry.lobby_code.as_deref());
        }
    }
    st.players.remove(&player);
    log::info!(
        "player {:?} disconnected ({} online, {} sessions)",
        player,
        st.players.len(),
        st.sessions.len()
    );
}
