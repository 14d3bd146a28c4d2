//! Process-wide matchmaking state: the FIFO queue, outstanding private
//! lobbies, and the set of players already inside a session.
//!
//! The matchmaker is a plain injectable struct so pairing logic can be
//! tested without a live transport; the server serializes access to it.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::Rng;

use crate::common::{GameError, PlayerId};
use crate::config::{LOBBY_CODE_ALPHABET, LOBBY_CODE_LEN};

/// An outstanding lobby code. A consumed code stays in the map as `Full`
/// until the session it started ends, so a late joiner gets `LobbyFull`
/// rather than a recycled code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lobby {
    Waiting(PlayerId),
    Full,
}

/// A successful pairing: `first` had been waiting, `second` completed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub first: PlayerId,
    pub second: PlayerId,
    /// Set when the pair came from a private lobby; the code is freed once
    /// the session ends.
    pub lobby_code: Option<String>,
}

/// Matchmaking registry. Initialized empty at process start; every mutation
/// happens under the server's state lock.
#[derive(Debug, Default)]
pub struct Matchmaker {
    queue: VecDeque<PlayerId>,
    lobbies: HashMap<String, Lobby>,
    in_game: HashSet<PlayerId>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `player` for a random opponent. Returns the pair if someone
    /// was already waiting (strict FIFO: oldest waiter pairs first), `None`
    /// if the player now waits. Any prior waiting state of `player` is
    /// cancelled first.
    pub fn enqueue(&mut self, player: PlayerId) -> Result<Option<Pair>, GameError> {
        if self.in_game.contains(&player) {
            return Err(GameError::AlreadyInGame);
        }
        self.cancel(player);
        if let Some(waiting) = self.queue.pop_front() {
            self.in_game.insert(waiting);
            self.in_game.insert(player);
            return Ok(Some(Pair {
                first: waiting,
                second: player,
                lobby_code: None,
            }));
        }
        self.queue.push_back(player);
        Ok(None)
    }

    /// Remove `player` from the queue and reclaim any lobby it created
    /// that is still waiting. No-op otherwise.
    pub fn cancel(&mut self, player: PlayerId) {
        self.queue.retain(|&p| p != player);
        self.lobbies
            .retain(|_, lobby| *lobby != Lobby::Waiting(player));
    }

    /// Open a private lobby for `player` and return its code, unique among
    /// outstanding lobbies (collision regenerates).
    pub fn create_lobby<R: Rng>(
        &mut self,
        player: PlayerId,
        rng: &mut R,
    ) -> Result<String, GameError> {
        if self.in_game.contains(&player) {
            return Err(GameError::AlreadyInGame);
        }
        self.cancel(player);
        let code = loop {
            let candidate: String = (0..LOBBY_CODE_LEN)
                .map(|_| LOBBY_CODE_ALPHABET[rng.random_range(0..LOBBY_CODE_ALPHABET.len())] as char)
                .collect();
            if !self.lobbies.contains_key(&candidate) {
                break candidate;
            }
        };
        self.lobbies.insert(code.clone(), Lobby::Waiting(player));
        Ok(code)
    }

    /// Pair `player` with the creator of the lobby named `code`. The
    /// joiner's own waiting state is cancelled first, so joining one's own
    /// code reports `LobbyNotFound` (the lobby is reclaimed by the cancel).
    pub fn join_lobby(&mut self, code: &str, player: PlayerId) -> Result<Pair, GameError> {
        if self.in_game.contains(&player) {
            return Err(GameError::AlreadyInGame);
        }
        self.cancel(player);
        let lobby = self.lobbies.get_mut(code).ok_or(GameError::LobbyNotFound)?;
        let creator = match *lobby {
            Lobby::Waiting(creator) => creator,
            Lobby::Full => return Err(GameError::LobbyFull),
        };
        *lobby = Lobby::Full;
        self.in_game.insert(creator);
        self.in_game.insert(player);
        Ok(Pair {
            first: creator,
            second: player,
            lobby_code: Some(code.to_string()),
        })
    }

    /// Release a finished session's participants back to matchmaking and
    /// free its lobby code, if any, for reuse.
    pub fn release(&mut self, players: [PlayerId; 2], lobby_code: Option<&str>) {
        for player in players {
            self.in_game.remove(&player);
        }
        if let Some(code) = lobby_code {
            self.lobbies.remove(code);
        }
    }

    /// Forget `player` entirely on disconnect: queue slot, waiting lobby,
    /// and in-game mark (the session teardown handles its own release).
    pub fn remove(&mut self, player: PlayerId) {
        self.cancel(player);
        self.in_game.remove(&player);
    }

    /// Whether `player` currently holds a queue slot or a waiting lobby.
    pub fn is_waiting(&self, player: PlayerId) -> bool {
        self.queue.contains(&player)
            || self
                .lobbies
                .values()
                .any(|lobby| *lobby == Lobby::Waiting(player))
    }

    pub fn is_in_game(&self, player: PlayerId) -> bool {
        self.in_game.contains(&player)
    }

    /// Number of outstanding lobby codes, consumed ones included.
    pub fn outstanding_lobbies(&self) -> usize {
        self.lobbies.len()
    }
}
