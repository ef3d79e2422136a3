use std::io::{self, BufRead};
use std::process;
use std::thread;

use chessmate::{Game, HumanHandle, HumanPlayer, Move, Position};

fn print_help() {
    println!("Commands:");
    println!("  <move>    a UCI move such as e2e4, or g7g8q to promote");
    println!("  undo      take back the last full move");
    println!("  help      show this help");
    println!("  quit      leave the game");
}

/// The promotion letter's case selects the promoted piece's color, so the
/// same typed token is normalized per submitting side.
fn with_promotion_case(token: &str, uppercase: bool) -> String {
    if token.len() == 5 && token.is_char_boundary(4) {
        let (body, promotion) = token.split_at(4);
        let promotion = if uppercase {
            promotion.to_ascii_uppercase()
        } else {
            promotion.to_ascii_lowercase()
        };
        format!("{}{}", body, promotion)
    } else {
        token.to_string()
    }
}

fn submit_move(token: &str, white: &HumanHandle, black: &HumanHandle) {
    if let Ok(mv) = Move::from_uci(&with_promotion_case(token, true)) {
        if white.submit_move(mv) {
            return;
        }
    }
    match Move::from_uci(&with_promotion_case(token, false)) {
        Ok(mv) => {
            if !black.submit_move(mv) {
                println!("no turn is waiting for input");
            }
        }
        Err(err) => println!("{}", err),
    }
}

fn read_input(white: HumanHandle, black: HumanHandle) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        match line.trim() {
            "" => {}
            "help" => print_help(),
            "quit" | "exit" => process::exit(0),
            "undo" => {
                if !white.request_undo() && !black.request_undo() {
                    println!("nothing is waiting for input");
                }
            }
            token => submit_move(token, &white, &black),
        }
    }
    // stdin closed; nothing more can arrive.
    process::exit(0);
}

fn main() {
    env_logger::init();

    println!("chessmate - two players, one terminal");
    print_help();

    let white = HumanPlayer::new();
    let black = HumanPlayer::new();
    let white_handle = white.handle();
    let black_handle = black.handle();

    let mut game = Game::from_initial(Box::new(white), Box::new(black));
    game.subscribe(Box::new(|position: &Position, status| {
        println!("\n{}", position.board());
        println!("{}", position.to_notation());
        if status.is_ongoing() {
            println!("{} to move ({})", position.side_to_move(), status);
        } else {
            println!("game over: {} (undo to take back, quit to leave)", status);
        }
    }));

    println!("\n{}", game.current_position().board());
    println!("{} to move", game.current_position().side_to_move());

    thread::spawn(move || read_input(white_handle, black_handle));

    match game.run() {
        Ok(status) => println!("final result: {}", status),
        Err(fault) => {
            eprintln!("game aborted: {}", fault);
            process::exit(1);
        }
    }
}
