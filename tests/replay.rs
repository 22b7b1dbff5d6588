//! Fixture replay tests
//!
//! Loads recorded games from `tests/fixtures/games.json`, replays every
//! move attempt (including ones the engine should ignore), and checks:
//! - How many moves were accepted
//! - Winner and side to move at the end
//! - Winning line positions
//! - One notification per accepted move, each from an empty cell

use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::rc::Rc;

use gomoku_core::{CellStatus, Gomoku, Player, Position, Size};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Fixtures {
    version: String,
    games: Vec<Game>,
}

#[derive(Debug, Deserialize)]
struct Game {
    description: String,
    size: Size,
    moves: Vec<[i32; 2]>,
    accepted: usize,
    winner: Option<Player>,
    player: Player,
    winning_line: Option<Vec<[i32; 2]>>,
}

fn load_fixtures() -> Fixtures {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/games.json");
    let file = File::open(&path).expect("Failed to open game fixtures");
    serde_json::from_reader(BufReader::new(file)).expect("Failed to parse game fixtures")
}

#[test]
fn test_replay_fixture_games() {
    let fixtures = load_fixtures();
    assert_eq!(fixtures.version, "1");
    assert!(!fixtures.games.is_empty());

    let mut failures: Vec<String> = Vec::new();

    for game in &fixtures.games {
        let mut errors: Vec<String> = Vec::new();
        let mut engine = Gomoku::new(game.size);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        engine.subscribe(move |cell, prev| sink.borrow_mut().push((cell, prev)));

        let mut accepted = 0;
        for &[x, y] in &game.moves {
            if engine.attempt_move(x, y).is_accepted() {
                accepted += 1;
            }
        }

        if accepted != game.accepted {
            errors.push(format!("accepted: expected {}, got {}", game.accepted, accepted));
        }
        if engine.winner() != game.winner {
            errors.push(format!("winner: expected {:?}, got {:?}", game.winner, engine.winner()));
        }
        if engine.player() != game.player {
            errors.push(format!("player: expected {:?}, got {:?}", game.player, engine.player()));
        }

        let expected_line: Option<Vec<Position>> = game
            .winning_line
            .as_ref()
            .map(|line| line.iter().map(|&[x, y]| Position::new(x, y)).collect());
        if engine.winning_line() != expected_line.as_deref() {
            errors.push(format!(
                "winning line: expected {:?}, got {:?}",
                expected_line,
                engine.winning_line()
            ));
        }

        let events = events.borrow();
        if events.len() != accepted {
            errors.push(format!("events: expected {}, got {}", accepted, events.len()));
        }
        if events.iter().any(|(_, prev)| *prev != CellStatus::Empty) {
            errors.push("event with non-empty previous status".to_string());
        }
        if engine.stone_count() != accepted {
            errors.push(format!("stones: expected {}, got {}", accepted, engine.stone_count()));
        }

        if !errors.is_empty() {
            failures.push(format!("{}: {}", game.description, errors.join("; ")));
        }
    }

    println!(
        "Replayed {} games, {} failed",
        fixtures.games.len(),
        failures.len()
    );
    assert!(failures.is_empty(), "Fixture failures:\n{}", failures.join("\n"));
}

#[test]
fn test_fixture_sizes_are_validated() {
    let bad = r#"{ "column": 12, "row": 0 }"#;
    let err = serde_json::from_str::<Size>(bad).unwrap_err();
    assert!(err.to_string().contains("invalid board size 12x0"));
}

#[test]
fn test_events_replay_to_same_board() {
    // A collaborator that mirrors the board purely from notifications ends
    // up with the engine's own view.
    let mut engine = Gomoku::with_size(9, 7).unwrap();
    let mirror = Rc::new(RefCell::new(vec![vec![CellStatus::Empty; 7]; 9]));
    let sink = Rc::clone(&mirror);
    engine.subscribe(move |cell, _| {
        sink.borrow_mut()[cell.x as usize][cell.y as usize] = cell.status;
    });

    for (x, y) in [
        (4, 3), (4, 4), (5, 3), (5, 5), (3, 3), (9, 0), (4, 3), (6, 6), (6, 3), (0, 0), (2, 3),
    ] {
        engine.attempt_move(x, y);
    }

    let board = engine.board();
    let mirror = mirror.borrow();
    for (x, column) in board.columns().enumerate() {
        assert_eq!(column, &mirror[x][..], "column {} differs", x);
    }
    assert_eq!(engine.winner(), Some(Player::Black));
}
