//! Plain-text interactive client: menu commands, letter+digit targeting,
//! and board rendering for two humans on two terminals.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::board::Grid;
use crate::common::SessionId;
use crate::config::BOARD_SIZE;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::transport::{read_frame, write_frame, Connection};

/// Parse a target like `A5`: column letter then row digit.
fn parse_coord(input: &str) -> Result<(u8, u8), String> {
    if input.len() < 2 {
        return Err("Too short - need column letter and row number (e.g., A5)".to_string());
    }
    let mut chars = input.chars();
    let col_ch = chars.next().ok_or("No column letter")?.to_ascii_uppercase();
    if !col_ch.is_ascii_alphabetic() {
        return Err(format!("Invalid column '{}' - must be a letter A-J", col_ch));
    }
    let col = (col_ch as u8).wrapping_sub(b'A');
    if col as usize >= BOARD_SIZE {
        return Err(format!("Column '{}' out of bounds - must be A-J", col_ch));
    }
    let row_str: String = chars.collect();
    let row: u8 = row_str
        .parse()
        .map_err(|_| format!("Invalid row '{}' - must be a number 0-9", row_str))?;
    if row as usize >= BOARD_SIZE {
        return Err(format!("Row {} out of bounds - must be 0-9", row));
    }
    Ok((row, col))
}

fn print_grid(title: &str, grid: &Grid) {
    println!("  {}", title);
    print!("    ");
    for c in 0..BOARD_SIZE {
        print!(" {}", (b'A' + c as u8) as char);
    }
    println!();
    for (r, row) in grid.iter().enumerate() {
        print!("  {:2} ", r);
        for ch in row {
            print!(" {}", ch);
        }
        println!();
    }
}

fn print_boards(my_board: &Grid, opponent_view_board: &Grid) {
    println!();
    print_grid("Opponent (S hidden):", opponent_view_board);
    print_grid("Your fleet:", my_board);
    println!("  Legend: S=Ship  X=Hit  O=Miss  ~=Water");
}

fn print_menu() {
    println!();
    println!("Commands:");
    println!("  find        queue for a random opponent");
    println!("  cancel      leave the queue");
    println!("  lobby       create a private lobby");
    println!("  join CODE   join a friend's lobby");
    println!("  quit        exit");
}

/// Connect to the authority at `connect` and run the interactive loop
/// until the user quits or the server goes away.
pub async fn run(connect: &str, username: &str) -> anyhow::Result<()> {
    let connection = Connection::connect(connect).await?;
    let (mut read_half, mut write_half) = connection.into_split();

    // The reader task owns the receive side: read_frame is not
    // cancellation-safe, so it must not sit inside the select.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    tokio::spawn(async move {
        loop {
            match read_frame::<_, ServerMessage>(&mut read_half).await {
                Ok(msg) => {
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let username = username.to_string();
    write_frame(
        &mut write_half,
        &ClientMessage::RegisterPlayer {
            username: username.clone(),
        },
    )
    .await?;

    println!("Connected to {} as {}.", connect, username);
    print_menu();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut room: Option<SessionId> = None;

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let msg = match msg {
                    Some(msg) => msg,
                    None => {
                        println!("Server closed the connection.");
                        break;
                    }
                };
                match msg {
                    ServerMessage::MainMenu => print_menu(),
                    ServerMessage::FindingGame { message } => println!("{}", message),
                    ServerMessage::PrivateLobbyCreated { room_code } => {
                        println!("Lobby created. Share this code: {}", room_code);
                    }
                    ServerMessage::GameStarted {
                        room_id,
                        my_board,
                        opponent_view_board,
                        is_my_turn,
                        opponent_name,
                    } => {
                        room = Some(room_id);
                        println!("Game on! You are facing {}.", opponent_name);
                        print_boards(&my_board, &opponent_view_board);
                        if is_my_turn {
                            println!("Your move (e.g., A5):");
                        } else {
                            println!("Waiting for {} to move...", opponent_name);
                        }
                    }
                    ServerMessage::UpdateGameState {
                        my_board,
                        opponent_view_board,
                        is_my_turn,
                        message,
                    } => {
                        println!("{}", message);
                        print_boards(&my_board, &opponent_view_board);
                        if is_my_turn {
                            println!("Your move (e.g., A5):");
                        } else {
                            println!("Waiting for opponent...");
                        }
                    }
                    ServerMessage::GameOver { winner_name, opponent_board } => {
                        println!("Game over: {} wins!", winner_name);
                        print_grid("Opponent's full fleet:", &opponent_board);
                        room = None;
                        print_menu();
                    }
                    ServerMessage::OpponentDisconnected { message } => {
                        println!("{}", message);
                        room = None;
                        print_menu();
                    }
                    ServerMessage::Error { message } => println!("Error: {}", message),
                }
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("quit") {
                    break;
                }
                let msg = if let Some(room_id) = room {
                    match parse_coord(input) {
                        Ok((row, col)) => ClientMessage::MakeMove { room_id, row, col },
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    }
                } else if input.eq_ignore_ascii_case("find") {
                    ClientMessage::FindGame { username: username.clone() }
                } else if input.eq_ignore_ascii_case("cancel") {
                    ClientMessage::CancelFindGame
                } else if input.eq_ignore_ascii_case("lobby") {
                    ClientMessage::CreatePrivateLobby
                } else if let Some(code) = input
                    .strip_prefix("join ")
                    .or_else(|| input.strip_prefix("JOIN "))
                {
                    ClientMessage::JoinPrivateLobby {
                        room_code: code.trim().to_ascii_uppercase(),
                        username: username.clone(),
                    }
                } else {
                    println!("Unknown command: {}", input);
                    print_menu();
                    continue;
                };
                write_frame(&mut write_half, &msg).await?;
            }
        }
    }

    Ok(())
}
