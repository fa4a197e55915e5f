use std::sync::Mutex;
use std::time::Instant;
use log::info;
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::{Value, json};
use crate::board::{Board, Color, Move, Outcome, PieceKind};
use crate::engine::Engine;
use crate::error::{GameError, GameResult};

pub struct Game {
    started: bool,
    player_color: Color,
    board: Board,
    engine: Engine,
    random_opening: bool,
    clock: Option<Instant>,
}

#[derive(Serialize, Debug)]
struct EndReport {
    winner: Option<Color>,
    reason: &'static str,
    player_won: bool,
    elapsed_secs: u64,
}

impl Game {
    pub fn new(engine: Engine, random_opening: bool) -> Self {
        Self {
            started: false,
            player_color: Color::Black,
            board: Board::new(),
            engine,
            random_opening,
            clock: None,
        }
    }

    fn restart(&mut self, player_color: Color) {
        *self = Self {
            started: true,
            player_color,
            ..Self::new(self.engine, self.random_opening)
        };
    }

    /// The clock runs from the first ply of the game.
    fn start_clock(&mut self) {
        self.clock.get_or_insert_with(Instant::now);
    }

    fn end_report(&self, outcome: Outcome) -> EndReport {
        let winner = outcome.winner();
        EndReport {
            winner,
            reason: outcome.reason(),
            player_won: winner == Some(self.player_color),
            elapsed_secs: self.clock.map_or(0, |clock| clock.elapsed().as_secs()),
        }
    }

    fn position_report(&self) -> Value {
        json!({
            "legal_moves": self.board.legal_moves(),
            "fen": self.board.to_fen(),
            "turn": self.board.side_to_move,
            "check": self.board.is_check(),
        })
    }
}

pub fn handle_message(game_mutex: &Mutex<Game>, data: Value) -> GameResult<Value> {
    let mut game = game_mutex.lock()
        .map_err(|_| GameError::Internal { message: "game state lock poisoned".to_string() })?;

    let map = data.as_object()
        .ok_or_else(|| GameError::invalid_message("Expected a dict"))?;

    // client message protocol: "start", "move", "reset"
    // server message protocol: "move", "legal_moves", "end", "reset", "error"
    if map.contains_key("start") {
        let player_is_black = data["start"].as_bool()
            .ok_or_else(|| GameError::invalid_message("Expected boolean field: start"))?;
        handle_start(&mut game, player_is_black)
    } else if map.contains_key("move") {
        if !game.started {
            return Err(GameError::NotStarted);
        }
        let player_move: Move = serde_json::from_value(data["move"].clone())?;
        handle_move(&mut game, player_move)
    } else if map.contains_key("reset") {
        let (engine, random_opening) = (game.engine, game.random_opening);
        *game = Game::new(engine, random_opening);
        info!("Game reset");
        Ok(json!({ "reset": true }))
    } else {
        Err(GameError::invalid_message(format!("Invalid message: {}", data)))
    }
}

fn handle_start(game: &mut Game, player_is_black: bool) -> GameResult<Value> {
    let player_color = if player_is_black { Color::Black } else { Color::White };
    game.restart(player_color);
    info!("New game, player is {:?}, search depth {}", player_color, game.engine.depth());
    if game.board.side_to_move == player_color {
        Ok(game.position_report())
    } else {
        make_engine_move(game, true)
    }
}

fn handle_move(game: &mut Game, player_move: Move) -> GameResult<Value> {
    if game.board.is_game_over() {
        return Err(GameError::GameOver);
    }
    let player_move = with_default_promotion(&game.board, player_move);
    game.board.make_move(player_move)?;
    game.start_clock();
    match check_game_over(game) {
        Some(game_over) => Ok(game_over),
        None => make_engine_move(game, false),
    }
}

/// A pawn reaching the last rank without a promotion choice becomes a queen.
/// A promotion choice on a move that does not promote is dropped.
fn with_default_promotion(board: &Board, player_move: Move) -> Move {
    let legal_moves = board.legal_moves();
    let candidate = match player_move.promotion {
        Some(_) => Move::new(player_move.from, player_move.to),
        None => Move::promoting(player_move.from, player_move.to, PieceKind::Queen),
    };
    if !legal_moves.contains(&player_move) && legal_moves.contains(&candidate) {
        candidate
    } else {
        player_move
    }
}

/// `opening` is set only when the engine plays the first move of the game.
fn make_engine_move(game: &mut Game, opening: bool) -> GameResult<Value> {
    let engine_move = if opening && game.random_opening {
        let opening = game.board.legal_moves().choose(&mut rand::thread_rng()).copied()
            .ok_or(GameError::NoEngineMove)?;
        game.board.make_move(opening)?;
        opening
    } else {
        let result = game.engine.best_move(&mut game.board).ok_or(GameError::NoEngineMove)?;
        info!("Engine searched {} nodes, score {:.2}", result.nodes, result.score);
        result.best_move
    };
    game.start_clock();
    info!("Engine played {}", engine_move);

    match check_game_over(game) {
        Some(mut game_over) => {
            game_over["move"] = json!(engine_move);
            Ok(game_over)
        }
        None => {
            let mut response = game.position_report();
            response["move"] = json!(engine_move);
            Ok(response)
        }
    }
}

fn check_game_over(game: &Game) -> Option<Value> {
    let outcome = game.board.outcome()?;
    let report = game.end_report(outcome);
    info!("Game over: {:?}", report);
    Some(json!({ "end": report, "fen": game.board.to_fen() }))
}
