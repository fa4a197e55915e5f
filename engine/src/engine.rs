use std::fmt;
use log::{debug, error};
use crate::board::{Board, Color, Move, Undo};
use crate::eval;

/// What the search needs from a rules implementation. One position is
/// shared by the whole search tree, so every `apply` is paired with an
/// `undo` before control returns to the caller.
pub trait Position {
    type Move: Copy + fmt::Display;
    type Undo;

    /// Legal moves for the side to move. The order decides ties.
    fn legal_moves(&self) -> Vec<Self::Move>;
    fn apply(&mut self, mv: Self::Move) -> Self::Undo;
    fn undo(&mut self, undo: Self::Undo);
    /// Drawn by rule even though moves remain.
    fn is_drawn(&self) -> bool;
    /// Whether the maximizing side is to move.
    fn white_to_move(&self) -> bool;
    fn evaluate(&self) -> f64;
}

impl Position for Board {
    type Move = Move;
    type Undo = Undo;

    fn legal_moves(&self) -> Vec<Move> {
        Board::legal_moves(self)
    }

    fn apply(&mut self, mv: Move) -> Undo {
        Board::apply(self, mv)
    }

    fn undo(&mut self, undo: Undo) {
        Board::undo(self, undo)
    }

    fn is_drawn(&self) -> bool {
        self.draw_by_rule().is_some()
    }

    fn white_to_move(&self) -> bool {
        self.side_to_move == Color::White
    }

    fn evaluate(&self) -> f64 {
        eval::evaluate(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<M> {
    pub best_move: M,
    pub score: f64,
    pub nodes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    depth: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DEPTH)
    }
}

impl Engine {
    pub const DEFAULT_DEPTH: u32 = 3;

    /// Depth is counted in plies including the root move, so at least 1.
    pub fn new(depth: u32) -> Self {
        Self { depth: depth.max(1) }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Scores every root move and returns the best one without playing it.
    /// White keeps the first strictly higher score, Black the first strictly
    /// lower one. `None` means the caller asked for a move in a finished game.
    pub fn search<P: Position>(&self, position: &mut P) -> Option<SearchResult<P::Move>> {
        let moves = position.legal_moves();
        if moves.is_empty() {
            error!("engine asked to move in a position without legal moves");
            return None;
        }

        let maximizing = position.white_to_move();
        let mut search = Search::default();
        let mut best: Option<(P::Move, f64)> = None;
        for mv in moves {
            let undo = position.apply(mv);
            let score = search.minimax(
                position,
                self.depth - 1,
                f64::NEG_INFINITY,
                f64::INFINITY,
                !maximizing,
            );
            position.undo(undo);
            debug!("root move {}: {:.2}", mv, score);

            let improves = match best {
                None => true,
                Some((_, best_score)) if maximizing => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if improves {
                best = Some((mv, score));
            }
        }

        best.map(|(best_move, score)| SearchResult { best_move, score, nodes: search.nodes })
    }

    /// Searches and then plays the chosen move on `position`.
    pub fn best_move<P: Position>(&self, position: &mut P) -> Option<SearchResult<P::Move>> {
        let result = self.search(position)?;
        position.apply(result.best_move);
        debug!("depth {} search visited {} nodes", self.depth, result.nodes);
        Some(result)
    }
}

#[derive(Default)]
struct Search {
    nodes: u64,
}

impl Search {
    /// Alpha-beta minimax. Depth 0, a rule draw or a position without moves
    /// returns the static evaluation; mates are not scored specially.
    fn minimax<P: Position>(
        &mut self,
        position: &mut P,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        maximizing: bool,
    ) -> f64 {
        self.nodes += 1;
        if depth == 0 || position.is_drawn() {
            return position.evaluate();
        }
        let moves = position.legal_moves();
        if moves.is_empty() {
            return position.evaluate();
        }

        if maximizing {
            let mut best = f64::NEG_INFINITY;
            for mv in moves {
                let undo = position.apply(mv);
                let score = self.minimax(position, depth - 1, alpha, beta, false);
                position.undo(undo);
                best = best.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = f64::INFINITY;
            for mv in moves {
                let undo = position.apply(mv);
                let score = self.minimax(position, depth - 1, alpha, beta, true);
                position.undo(undo);
                best = best.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::INITIAL_FEN;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    /// Plain minimax without cutoffs, the reference for the pruned search.
    fn full_minimax<P: Position>(position: &mut P, depth: u32, maximizing: bool) -> f64 {
        if depth == 0 || position.is_drawn() {
            return position.evaluate();
        }
        let moves = position.legal_moves();
        if moves.is_empty() {
            return position.evaluate();
        }
        let scores = moves.into_iter().map(|mv| {
            let undo = position.apply(mv);
            let score = full_minimax(position, depth - 1, !maximizing);
            position.undo(undo);
            score
        });
        if maximizing {
            scores.fold(f64::NEG_INFINITY, f64::max)
        } else {
            scores.fold(f64::INFINITY, f64::min)
        }
    }

    fn alpha_beta<P: Position>(position: &mut P, depth: u32, maximizing: bool) -> f64 {
        Search::default().minimax(position, depth, f64::NEG_INFINITY, f64::INFINITY, maximizing)
    }

    const POSITIONS: [&str; 5] = [
        INITIAL_FEN,
        "4k3/8/8/3q4/8/2N5/8/4K3 w - - 0 1",
        "r1bqkbnr/pppp1ppp/2n5/4p3/3PP3/5N2/PPP2PPP/RNBQKB1R b KQkq - 0 3",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];

    /// A hand-built game tree: inner nodes list children, leaves carry scores.
    struct Tree {
        children: Vec<Vec<usize>>,
        scores: Vec<f64>,
        path: Vec<usize>,
        applied: usize,
    }

    impl Tree {
        fn new(children: Vec<Vec<usize>>, scores: Vec<f64>) -> Self {
            Self { children, scores, path: vec![0], applied: 0 }
        }

        fn node(&self) -> usize {
            *self.path.last().unwrap()
        }
    }

    impl Position for Tree {
        type Move = usize;
        type Undo = ();

        fn legal_moves(&self) -> Vec<usize> {
            self.children[self.node()].clone()
        }

        fn apply(&mut self, mv: usize) {
            self.path.push(mv);
            self.applied += 1;
        }

        fn undo(&mut self, _undo: ()) {
            self.path.pop();
        }

        fn is_drawn(&self) -> bool {
            false
        }

        fn white_to_move(&self) -> bool {
            self.path.len() % 2 == 1
        }

        fn evaluate(&self) -> f64 {
            self.scores[self.node()]
        }
    }

    /// Root 0 -> {1, 2}; 1 -> {3, 4}; 2 -> {5, 6}. Once node 5 scores 2.0
    /// under node 2, node 6 cannot beat the 3.0 already found under node 1.
    fn pruning_tree() -> Tree {
        Tree::new(
            vec![vec![1, 2], vec![3, 4], vec![5, 6], vec![], vec![], vec![], vec![]],
            vec![0.0, 0.0, 0.0, 3.0, 5.0, 2.0, 9.0],
        )
    }

    #[test]
    fn depth_zero_returns_the_static_evaluation() {
        for fen in POSITIONS {
            let mut position = board(fen);
            let before = position.clone();
            assert_eq!(alpha_beta(&mut position, 0, true), eval::evaluate(&position));
            assert_eq!(alpha_beta(&mut position, 0, false), eval::evaluate(&position));
            assert_eq!(position, before);
        }
    }

    #[test]
    fn terminal_positions_return_the_static_evaluation() {
        let mated = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let stalemated = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let bare_kings = board("8/8/8/4k3/8/8/8/4K3 w - - 0 1");
        for position in [mated, stalemated, bare_kings] {
            let expected = eval::evaluate(&position);
            for depth in 1..=4 {
                let mut copy = position.clone();
                let maximizing = copy.white_to_move();
                assert_eq!(alpha_beta(&mut copy, depth, maximizing), expected);
            }
        }
    }

    #[test]
    fn pruning_matches_full_minimax_on_chess_positions() {
        for fen in POSITIONS {
            for depth in 1..=3 {
                let mut position = board(fen);
                let maximizing = position.white_to_move();
                let expected = full_minimax(&mut position, depth, maximizing);
                assert_eq!(
                    alpha_beta(&mut position, depth, maximizing),
                    expected,
                    "{} at depth {}",
                    fen,
                    depth,
                );
            }
        }
    }

    #[test]
    fn pruning_skips_refuted_siblings() {
        let mut tree = pruning_tree();
        assert_eq!(full_minimax(&mut tree, 2, true), 3.0);
        assert_eq!(tree.applied, 6);

        let mut tree = pruning_tree();
        assert_eq!(alpha_beta(&mut tree, 2, true), 3.0);
        assert_eq!(tree.applied, 5);
        assert_eq!(tree.path, vec![0]);
    }

    #[test]
    fn search_leaves_the_position_untouched() {
        for fen in POSITIONS {
            let mut position = board(fen);
            let before = position.clone();
            assert!(Engine::new(3).search(&mut position).is_some());
            assert_eq!(position, before);
        }
    }

    #[test]
    fn search_is_deterministic() {
        for fen in POSITIONS {
            let first = Engine::new(3).search(&mut board(fen));
            let second = Engine::new(3).search(&mut board(fen));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn ties_go_to_the_first_generated_move() {
        // every double push scores +0.2; a2a4 is generated first
        let result = Engine::new(1).search(&mut Board::new()).unwrap();
        assert_eq!(result.best_move.to_string(), "a2a4");
        assert_eq!(result.score, 0.2);

        // both children score 1.0 for Black; the first one wins
        let mut tree = Tree::new(vec![vec![1, 2], vec![], vec![]], vec![0.0, 1.0, 1.0]);
        let result = Engine::new(1).search(&mut tree).unwrap();
        assert_eq!(result.best_move, 1);
    }

    #[test]
    fn black_minimizes_at_the_root() {
        let mut tree = Tree::new(vec![vec![1, 2, 3], vec![], vec![], vec![]], vec![0.0, 1.0, -2.0, -2.0]);
        // an even path length puts Black on move
        tree.path.push(0);
        let result = Engine::new(1).search(&mut tree).unwrap();
        assert_eq!(result.best_move, 2);
        assert_eq!(result.score, -2.0);
    }

    #[test]
    fn opening_prefers_a_double_pawn_push() {
        // each double push is answered by a double push: 0.2 - 0.2
        let mut position = Board::new();
        let result = Engine::new(2).search(&mut position).unwrap();
        assert_eq!(result.best_move.to_string(), "a2a4");
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn wins_a_hanging_queen() {
        let mut position = board("4k3/8/8/3q4/8/2N5/8/4K3 w - - 0 1");
        let result = Engine::new(2).best_move(&mut position).unwrap();
        assert_eq!(result.best_move.to_string(), "c3d5");
        assert!(result.score > 2.0);
        assert_eq!(position.to_fen(), "4k3/8/8/3N4/8/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn black_recaptures_when_searching_for_black() {
        // after 3.Nxe5?? Nxe5 wins the knight back for Black
        let mut position = board("r1bqkbnr/pppp1ppp/2n5/4N3/4P3/8/PPPP1PPP/RNBQKB1R b KQkq - 0 3");
        let result = Engine::new(2).search(&mut position).unwrap();
        assert_eq!(result.best_move.to_string(), "c6e5");
    }

    #[test]
    fn best_move_commits_exactly_one_ply() {
        let mut position = Board::new();
        let result = Engine::new(2).best_move(&mut position).unwrap();
        let mut expected = Board::new();
        expected.make_move(result.best_move).unwrap();
        assert_eq!(position, expected);
        assert_eq!(position.side_to_move, Color::Black);
    }

    #[test]
    fn no_move_in_finished_games() {
        let mut mated = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let before = mated.clone();
        assert_eq!(Engine::new(3).best_move(&mut mated), None);
        assert_eq!(mated, before);
    }

    #[test]
    fn depth_is_at_least_one() {
        assert_eq!(Engine::new(0).depth(), 1);
        assert_eq!(Engine::default().depth(), Engine::DEFAULT_DEPTH);
    }
}
