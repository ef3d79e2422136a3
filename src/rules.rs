use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::castling::CastlingRight;
use crate::coord::Coordinate;
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceKind};
use crate::position::Position;

/// Verdict over the last position of a history, in strict precedence order
/// checkmate > stalemate > fifty-move > threefold > check > ongoing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Ongoing,
    Check(Color),
    CheckmateWonBy(Color),
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl GameStatus {
    /// Whether the game continues. A check is ongoing; everything else
    /// besides `Ongoing` is terminal.
    pub fn is_ongoing(self) -> bool {
        matches!(self, GameStatus::Ongoing | GameStatus::Check(_))
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Ongoing => write!(f, "ongoing"),
            GameStatus::Check(color) => write!(f, "ongoing, {} in check", color),
            GameStatus::CheckmateWonBy(color) => write!(f, "checkmate, {} won", color),
            GameStatus::Stalemate => write!(f, "draw, stalemate"),
            GameStatus::ThreefoldRepetition => write!(f, "draw, threefold repetition"),
            GameStatus::FiftyMoveRule => write!(f, "draw, fifty-move rule"),
        }
    }
}

/// The central legality predicate.
///
/// With `check_king_safety` set (the public default) the move must belong to
/// the side to move and must not leave the mover's own king attacked. With
/// it cleared this is the raw pseudo-legal predicate; square-attack probing
/// relies on that form to cut the recursion between king safety and
/// castling safety.
pub fn is_move_valid(mv: &Move, position: &Position, check_king_safety: bool) -> bool {
    let piece = match position.board().piece_at(mv.from) {
        Some(piece) => piece,
        None => return false,
    };
    if check_king_safety && piece.color != position.side_to_move() {
        return false;
    }
    if !piece_allows(piece, mv, position) {
        return false;
    }
    !check_king_safety || !leaves_own_king_attacked(mv, position, piece.color)
}

fn piece_allows(piece: Piece, mv: &Move, position: &Position) -> bool {
    match piece.kind {
        PieceKind::Pawn => pawn_allows(piece, mv, position),
        PieceKind::Knight => knight_allows(piece, mv, position.board()),
        PieceKind::Bishop => bishop_allows(mv, position.board()),
        PieceKind::Rook => rook_allows(mv, position.board()),
        PieceKind::Queen => queen_allows(mv, position.board()),
        PieceKind::King => king_allows(piece, mv, position),
    }
}

fn pawn_allows(piece: Piece, mv: &Move, position: &Position) -> bool {
    moves_toward_opponent(piece, mv)
        && promotion_matches_back_rank(piece, mv)
        && destination_free_or_enemy(piece, mv, position.board())
        && (straight_advance(piece, mv, position.board())
            || diagonal_capture(piece, mv, position.board())
            || en_passant_capture(mv, position))
}

fn moves_toward_opponent(piece: Piece, mv: &Move) -> bool {
    mv.rank_direction() == piece.color.forward()
}

/// Promotion is mandatory exactly on the back rank, to a same-color piece
/// that is neither king nor pawn, and illegal anywhere else.
fn promotion_matches_back_rank(piece: Piece, mv: &Move) -> bool {
    let promoting = mv.to.rank_number() == piece.color.back_rank();
    match (promoting, mv.promotion) {
        (false, None) => true,
        (true, Some(promotion)) => {
            promotion.color == piece.color
                && !matches!(promotion.kind, PieceKind::King | PieceKind::Pawn)
        }
        _ => false,
    }
}

fn destination_free_or_enemy(piece: Piece, mv: &Move, board: &Board) -> bool {
    board
        .piece_at(mv.to)
        .map_or(true, |occupant| occupant.color != piece.color)
}

fn straight_advance(piece: Piece, mv: &Move, board: &Board) -> bool {
    let limit = if mv.from.rank_number() == piece.color.pawn_rank() {
        2
    } else {
        1
    };
    mv.file_delta() == 0 && can_traverse(mv, board, false, limit)
}

fn diagonal_capture(piece: Piece, mv: &Move, board: &Board) -> bool {
    mv.is_diagonal()
        && mv.rank_delta().abs() == 1
        && board
            .piece_at(mv.to)
            .map_or(false, |occupant| occupant.color != piece.color)
}

fn en_passant_capture(mv: &Move, position: &Position) -> bool {
    mv.is_diagonal()
        && mv.rank_delta().abs() == 1
        && position.en_passant_target() == Some(mv.to)
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

fn knight_allows(piece: Piece, mv: &Move, board: &Board) -> bool {
    mv.promotion.is_none()
        && KNIGHT_OFFSETS
            .iter()
            .any(|(file, rank)| mv.from.offset(*file, *rank) == Some(mv.to))
        && destination_free_or_enemy(piece, mv, board)
}

fn bishop_allows(mv: &Move, board: &Board) -> bool {
    mv.promotion.is_none() && mv.is_diagonal() && can_traverse(mv, board, true, 7)
}

fn rook_allows(mv: &Move, board: &Board) -> bool {
    mv.promotion.is_none() && mv.is_orthogonal() && can_traverse(mv, board, true, 7)
}

fn queen_allows(mv: &Move, board: &Board) -> bool {
    rook_allows(mv, board) || bishop_allows(mv, board)
}

fn king_allows(piece: Piece, mv: &Move, position: &Position) -> bool {
    mv.promotion.is_none()
        && (castling_allows(piece, mv, position)
            || (mv.file_delta().abs() <= 1
                && mv.rank_delta().abs() <= 1
                && queen_allows(mv, position.board())))
}

fn castling_allows(piece: Piece, mv: &Move, position: &Position) -> bool {
    let right = match CastlingRight::from_king_move(mv) {
        Some(right) => right,
        None => return false,
    };
    if right.color() != piece.color || !position.castling_rights().contains(right) {
        return false;
    }
    if right
        .between_squares()
        .iter()
        .any(|square| position.board().piece_at(*square).is_some())
    {
        return false;
    }
    // The king may not castle out of, through, or into an attack.
    let opponent = right.color().opponent();
    if is_square_attacked(right.king_home(), position, opponent) {
        return false;
    }
    !right
        .between_squares()
        .iter()
        .any(|square| is_square_attacked(*square, position, opponent))
}

/// Walks the straight line of the move across the board. Intermediate
/// squares must be empty; the final square may hold an opposite-color piece
/// when `allow_final_capture` is set. `max_steps` bounds the per-axis delta.
fn can_traverse(mv: &Move, board: &Board, allow_final_capture: bool, max_steps: i8) -> bool {
    if !mv.is_traversable() {
        return false;
    }
    if mv.file_delta().abs() > max_steps || mv.rank_delta().abs() > max_steps {
        return false;
    }
    for square in mv.traversal_squares() {
        let occupant = board.piece_at(square);
        if square == mv.to {
            return match occupant {
                None => true,
                Some(target) => {
                    allow_final_capture
                        && board
                            .piece_at(mv.from)
                            .map_or(false, |mover| mover.color != target.color)
                }
            };
        }
        if occupant.is_some() {
            return false;
        }
    }
    false
}

fn leaves_own_king_attacked(mv: &Move, position: &Position, color: Color) -> bool {
    // The probe board is a plain relocation; castling rook legs and en
    // passant removal are not replayed here.
    let scratch = position.with_board(position.board().with_move(mv));
    king_is_attacked(&scratch, color)
}

fn king_is_attacked(position: &Position, color: Color) -> bool {
    let king = Piece::new(PieceKind::King, color);
    match position.board().find_all(king).first() {
        Some(square) => is_square_attacked(*square, position, color.opponent()),
        None => false,
    }
}

/// Whether the side to move's king is currently attacked.
pub fn is_king_in_check(position: &Position) -> bool {
    king_is_attacked(position, position.side_to_move())
}

/// True iff any piece of `by` has a pseudo-legal move onto `target`. Pawn
/// attacks on the back rank only validate with a promotion attached, so
/// each origin is probed both plainly and with a synthetic queen promotion.
pub fn is_square_attacked(target: Coordinate, position: &Position, by: Color) -> bool {
    let queen = Piece::new(PieceKind::Queen, by);
    for from in Coordinate::all() {
        match position.board().piece_at(from) {
            Some(piece) if piece.color == by => {}
            _ => continue,
        }
        if is_move_valid(&Move::new(from, target), position, false)
            || is_move_valid(&Move::with_promotion(from, target, queen), position, false)
        {
            return true;
        }
    }
    false
}

fn side_has_any_move(position: &Position) -> bool {
    let side = position.side_to_move();
    let queen = Piece::new(PieceKind::Queen, side);
    for from in Coordinate::all() {
        match position.board().piece_at(from) {
            Some(piece) if piece.color == side => {}
            _ => continue,
        }
        for to in Coordinate::all() {
            if is_move_valid(&Move::new(from, to), position, true)
                || is_move_valid(&Move::with_promotion(from, to, queen), position, true)
            {
                return true;
            }
        }
    }
    false
}

fn has_threefold_repetition(history: &[Position]) -> bool {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for position in history {
        let count = counts.entry(position.board().to_notation()).or_insert(0);
        *count += 1;
        if *count >= 3 {
            return true;
        }
    }
    false
}

/// Evaluates the game verdict over a history, oldest position first.
pub fn game_status(history: &[Position]) -> GameStatus {
    let current = match history.last() {
        Some(position) => position,
        None => {
            log::error!("game status requested for an empty history");
            return GameStatus::Ongoing;
        }
    };
    let side = current.side_to_move();
    let in_check = is_king_in_check(current);
    if !side_has_any_move(current) {
        return if in_check {
            GameStatus::CheckmateWonBy(side.opponent())
        } else {
            GameStatus::Stalemate
        };
    }
    if current.halfmove_clock() == 100 {
        return GameStatus::FiftyMoveRule;
    }
    if has_threefold_repetition(history) {
        return GameStatus::ThreefoldRepetition;
    }
    if in_check {
        return GameStatus::Check(side);
    }
    GameStatus::Ongoing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::INITIAL_NOTATION;
    use std::collections::BTreeSet;

    fn position(notation: &str) -> Position {
        Position::from_notation(notation).unwrap()
    }

    /// Every accepted UCI token from one origin square, probing plain moves
    /// and every promotion piece of both colors.
    fn allowed_from(position: &Position, from: &str, king_safety: bool) -> BTreeSet<String> {
        let from = Coordinate::from_algebraic(from).unwrap();
        let promotions = [
            Piece::WHITE_QUEEN,
            Piece::WHITE_ROOK,
            Piece::WHITE_BISHOP,
            Piece::WHITE_KNIGHT,
            Piece::BLACK_QUEEN,
            Piece::BLACK_ROOK,
            Piece::BLACK_BISHOP,
            Piece::BLACK_KNIGHT,
        ];
        let mut accepted = BTreeSet::new();
        for to in Coordinate::all() {
            let mut candidates = vec![Move::new(from, to)];
            candidates.extend(
                promotions
                    .iter()
                    .map(|piece| Move::with_promotion(from, to, *piece)),
            );
            for mv in candidates {
                if is_move_valid(&mv, position, king_safety) {
                    accepted.insert(mv.to_string());
                }
            }
        }
        accepted
    }

    fn expect_moves(notation: &str, from: &str, king_safety: bool, expected: &[&str]) {
        let expected: BTreeSet<String> = expected.iter().map(|text| text.to_string()).collect();
        assert_eq!(
            allowed_from(&position(notation), from, king_safety),
            expected,
            "moves from {} in {}",
            from,
            notation
        );
    }

    #[test]
    fn pawn_advances_one_or_two_from_home() {
        expect_moves(INITIAL_NOTATION, "e2", true, &["e2e3", "e2e4"]);
    }

    #[test]
    fn pawn_captures_diagonally() {
        let notation = "rnbqkbnr/pppppppp/8/8/8/4p3/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        // The e2 pawn is blocked head-on and cannot capture straight.
        expect_moves(notation, "e2", false, &[]);
        expect_moves(notation, "d2", false, &["d2d3", "d2d4", "d2e3"]);
    }

    #[test]
    fn pawn_promotion_is_mandatory_and_color_matched() {
        expect_moves(
            "8/6P1/8/8/8/2k5/8/2K5 w - - 0 1",
            "g7",
            true,
            &["g7g8Q", "g7g8R", "g7g8B", "g7g8N"],
        );
        expect_moves(
            "6nr/6P1/8/8/8/2k5/8/2K5 w - - 0 1",
            "g7",
            true,
            &["g7h8Q", "g7h8R", "g7h8B", "g7h8N"],
        );
    }

    #[test]
    fn pawn_takes_en_passant_only_on_the_target() {
        expect_moves(
            "rnbqkbnr/ppppp1pp/8/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "e5",
            true,
            &["e5e6", "e5f6"],
        );
        expect_moves(
            "rnbqkbnr/ppppp1pp/8/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3",
            "e5",
            true,
            &["e5e6"],
        );
    }

    #[test]
    fn knight_jumps_over_pieces() {
        expect_moves(INITIAL_NOTATION, "g1", true, &["g1f3", "g1h3"]);
        expect_moves(INITIAL_NOTATION, "b8", false, &["b8a6", "b8c6"]);
    }

    #[test]
    fn sliding_pieces_stop_at_blockers() {
        let notation = "8/8/8/8/3k4/8/8/R3K3 w Q - 0 1";
        // The a1 rook runs the file freely and the rank up to d1 (e1 is its
        // own king); the castle move e1c1 belongs to the king.
        expect_moves(
            notation,
            "a1",
            false,
            &["a1a2", "a1a3", "a1a4", "a1a5", "a1a6", "a1a7", "a1a8", "a1b1", "a1c1", "a1d1"],
        );
    }

    #[test]
    fn king_may_castle_when_path_is_clear_and_safe() {
        expect_moves(
            "rnbqkbnr/pp2pppp/2p5/1B6/4p3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 1",
            "e1",
            true,
            &["e1g1", "e1f1", "e1e2"],
        );
    }

    #[test]
    fn king_may_not_castle_out_of_check() {
        // Rule-level view, king safety suppressed: the castle is still
        // rejected because castling checks its own path attacks.
        expect_moves(
            "r2qk2r/ppp2ppp/5n2/4p3/1b1n4/1P1P2P1/PBP1QPBP/RN2K2R w KQkq - 0 1",
            "e1",
            false,
            &["e1d1", "e1f1", "e1d2"],
        );
    }

    #[test]
    fn castling_requires_the_right_to_survive() {
        // Same placement, but the kingside right has lapsed.
        expect_moves(
            "rnbqkbnr/pp2pppp/2p5/1B6/4p3/5N2/PPPP1PPP/RNBQK2R w Qkq - 0 1",
            "e1",
            true,
            &["e1f1", "e1e2"],
        );
    }

    #[test]
    fn pinned_piece_has_no_moves() {
        expect_moves("8/3k4/8/3b4/8/8/3R4/8 b - - 0 1", "d5", true, &[]);
    }

    #[test]
    fn cornered_king_finds_the_single_escape() {
        expect_moves("8/8/2q5/8/3KP3/8/4q3/8 w - - 0 1", "d4", true, &["d4e5"]);
    }

    #[test]
    fn smothered_king_has_no_moves() {
        expect_moves(
            "r1b1kb1r/pp2pppp/2n2n2/1p1q4/3P4/2P5/PP3PpP/RNBQR1K1 w - - 0 1",
            "g1",
            true,
            &[],
        );
    }

    #[test]
    fn wrong_color_moves_are_rejected_with_king_safety() {
        let initial = position(INITIAL_NOTATION);
        let black_reply = Move::from_uci("e7e5").unwrap();
        assert!(!is_move_valid(&black_reply, &initial, true));
        assert!(is_move_valid(&black_reply, &initial, false));
    }

    #[test]
    fn square_attack_probes_all_piece_kinds() {
        let initial = position(INITIAL_NOTATION);
        let square = |text: &str| Coordinate::from_algebraic(text).unwrap();
        assert!(is_square_attacked(square("f3"), &initial, Color::White));
        assert!(is_square_attacked(square("f6"), &initial, Color::Black));
        // The probe counts any pseudo-legal move onto the square, so the
        // e2 pawn's double push makes e4 "attacked" by white, while e5 is
        // beyond every white piece's reach.
        assert!(is_square_attacked(square("e4"), &initial, Color::White));
        assert!(!is_square_attacked(square("e5"), &initial, Color::White));
        assert!(!is_square_attacked(square("f3"), &initial, Color::Black));

        // A pawn one step from promotion still attacks the occupied rook
        // square; the probe must attach a promotion to see the capture.
        let promo = position("8/8/8/8/8/8/2p5/KR6 b - - 0 1");
        assert!(is_square_attacked(square("b1"), &promo, Color::Black));
        // The probe is move-based: an empty diagonal square draws no
        // pseudo-legal pawn move, so it does not count as attacked.
        assert!(!is_square_attacked(square("d1"), &promo, Color::Black));
    }

    #[test]
    fn detects_check() {
        let checked = position("rnbqkbnr/ppp1pppp/8/1B1p4/4P3/8/PPPP1PPP/RNBQK1NR b KQkq - 0 1");
        assert!(is_king_in_check(&checked));
        assert!(!is_king_in_check(&position(INITIAL_NOTATION)));
        assert_eq!(game_status(&[checked]), GameStatus::Check(Color::Black));
    }

    #[test]
    fn detects_checkmate() {
        let mated = position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 4 3");
        assert_eq!(
            game_status(&[mated]),
            GameStatus::CheckmateWonBy(Color::Black)
        );
    }

    #[test]
    fn detects_stalemate() {
        let stuck = position("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(game_status(&[stuck]), GameStatus::Stalemate);
    }

    #[test]
    fn fifty_move_rule_trips_at_exactly_one_hundred() {
        let at_limit = position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 100 60");
        assert_eq!(game_status(&[at_limit]), GameStatus::FiftyMoveRule);
        let short = position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 99 60");
        assert_eq!(game_status(&[short]), GameStatus::Ongoing);
    }

    #[test]
    fn threefold_repetition_counts_board_placements() {
        let mut history = vec![position(INITIAL_NOTATION)];
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
            let next = history
                .last()
                .unwrap()
                .after_move(&Move::from_uci(uci).unwrap())
                .unwrap();
            history.push(next);
        }
        assert_eq!(history.len(), 9);
        assert_eq!(game_status(&history), GameStatus::ThreefoldRepetition);
        // One shuffle short of the third occurrence the game is still on.
        assert_eq!(game_status(&history[..8]), GameStatus::Ongoing);
    }

    #[test]
    fn ongoing_for_the_initial_position() {
        assert_eq!(game_status(&[position(INITIAL_NOTATION)]), GameStatus::Ongoing);
    }

    #[test]
    fn status_text_is_human_readable() {
        assert_eq!(
            GameStatus::CheckmateWonBy(Color::Black).to_string(),
            "checkmate, black won"
        );
        assert_eq!(GameStatus::Stalemate.to_string(), "draw, stalemate");
        assert_eq!(
            GameStatus::Check(Color::White).to_string(),
            "ongoing, white in check"
        );
    }
}
