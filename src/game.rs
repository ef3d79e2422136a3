use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::EngineFault;
use crate::moves::Move;
use crate::piece::Color;
use crate::position::Position;
use crate::rules::{self, GameStatus};

/// What a player hands back when offered the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Play(Move),
    RequestUndo,
}

#[derive(Debug)]
struct Submission {
    color: Color,
    ply: usize,
    action: PlayerAction,
}

/// Single-use reply handle for one turn offer. Consuming `submit` enforces
/// the exactly-once resolution contract; dropping it without submitting
/// declines the offer. Submitting after the game has moved on is a no-op.
#[derive(Debug)]
pub struct Responder {
    color: Color,
    ply: usize,
    sender: Sender<Submission>,
}

impl Responder {
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn submit(self, action: PlayerAction) {
        // A closed channel means the round is over; nothing to do.
        let _ = self.sender.send(Submission {
            color: self.color,
            ply: self.ply,
            action,
        });
    }
}

/// A side's collaborator. The orchestrator offers each turn through
/// `begin_turn`; the player resolves it exactly once via the responder,
/// from any thread, whenever its move is ready.
pub trait Player {
    fn begin_turn(&self, position: &Position, responder: Responder);

    /// Interactive players get illegal input rejected and the turn
    /// re-offered; a non-interactive player producing an illegal move is an
    /// integrity fault.
    fn is_interactive(&self) -> bool {
        true
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A player driven from outside the game loop, e.g. by a terminal reader
/// thread. Stores the live responder until the front end resolves it.
#[derive(Default)]
pub struct HumanPlayer {
    pending: Arc<Mutex<Option<Responder>>>,
}

impl HumanPlayer {
    pub fn new() -> HumanPlayer {
        HumanPlayer::default()
    }

    /// A cloneable, thread-safe handle for feeding this player input.
    pub fn handle(&self) -> HumanHandle {
        HumanHandle {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl Player for HumanPlayer {
    fn begin_turn(&self, _position: &Position, responder: Responder) {
        *lock_ignoring_poison(&self.pending) = Some(responder);
    }
}

#[derive(Clone)]
pub struct HumanHandle {
    pending: Arc<Mutex<Option<Responder>>>,
}

impl HumanHandle {
    /// Resolves the pending turn with a move. Returns false when it is not
    /// this player's turn to respond.
    pub fn submit_move(&self, mv: Move) -> bool {
        self.resolve(PlayerAction::Play(mv))
    }

    pub fn request_undo(&self) -> bool {
        self.resolve(PlayerAction::RequestUndo)
    }

    fn resolve(&self, action: PlayerAction) -> bool {
        match lock_ignoring_poison(&self.pending).take() {
            Some(responder) => {
                responder.submit(action);
                true
            }
            None => false,
        }
    }
}

/// A player that replays a fixed script of actions, then declines further
/// turn offers. The `engine` flavor is non-interactive, standing in for an
/// external move generator.
pub struct ScriptedPlayer {
    actions: Mutex<VecDeque<PlayerAction>>,
    interactive: bool,
}

impl ScriptedPlayer {
    pub fn interactive(actions: impl IntoIterator<Item = PlayerAction>) -> ScriptedPlayer {
        ScriptedPlayer {
            actions: Mutex::new(actions.into_iter().collect()),
            interactive: true,
        }
    }

    pub fn engine(actions: impl IntoIterator<Item = PlayerAction>) -> ScriptedPlayer {
        ScriptedPlayer {
            actions: Mutex::new(actions.into_iter().collect()),
            interactive: false,
        }
    }
}

impl Player for ScriptedPlayer {
    fn begin_turn(&self, _position: &Position, responder: Responder) {
        if let Some(action) = lock_ignoring_poison(&self.actions).pop_front() {
            responder.submit(action);
        }
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Ordered positions since the start of the game. The seed position at
/// index 0 is never removed.
#[derive(Debug)]
pub struct History(Vec<Position>);

impl History {
    fn new(initial: Position) -> History {
        History(vec![initial])
    }

    pub fn positions(&self) -> &[Position] {
        &self.0
    }

    pub fn current(&self) -> &Position {
        match self.0.last() {
            Some(position) => position,
            None => unreachable!("history always holds the seed position"),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: the seed position is never removed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, position: Position) {
        self.0.push(position);
    }

    /// Removes one full move: two plies, or a single one when only one ply
    /// exists beyond the seed. At the seed this is a no-op.
    fn undo_full_move(&mut self) -> bool {
        if self.0.len() <= 1 {
            return false;
        }
        let plies = if self.0.len() == 2 { 1 } else { 2 };
        self.0.truncate(self.0.len() - plies);
        true
    }
}

/// Read-only notification fired after every processed input.
pub type Subscriber = Box<dyn FnMut(&Position, GameStatus)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

/// The orchestrator: owns the history, offers turns over per-round
/// channels, applies validated moves, honors undo requests, and notifies
/// subscribers. Moves are processed strictly one at a time.
pub struct Game {
    history: History,
    white: Box<dyn Player>,
    black: Box<dyn Player>,
    subscribers: Vec<(usize, Subscriber)>,
    next_subscription: usize,
}

impl Game {
    pub fn new(initial: Position, white: Box<dyn Player>, black: Box<dyn Player>) -> Game {
        Game {
            history: History::new(initial),
            white,
            black,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn from_initial(white: Box<dyn Player>, black: Box<dyn Player>) -> Game {
        Game::new(Position::initial(), white, black)
    }

    pub fn current_position(&self) -> &Position {
        self.history.current()
    }

    pub fn history(&self) -> &[Position] {
        self.history.positions()
    }

    pub fn status(&self) -> GameStatus {
        rules::game_status(self.history.positions())
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, subscriber));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id.0);
        self.subscribers.len() != before
    }

    fn player_for(&self, color: Color) -> &dyn Player {
        match color {
            Color::White => self.white.as_ref(),
            Color::Black => self.black.as_ref(),
        }
    }

    /// Runs the turn loop until no offered responder resolves: exhausted
    /// scripts, a disconnected front end, or a terminal game nobody asks to
    /// undo. Returns the status at that point.
    pub fn run(&mut self) -> Result<GameStatus, EngineFault> {
        loop {
            let receiver = self.offer_turn();
            let submission = match receiver.recv() {
                Ok(submission) => submission,
                Err(mpsc::RecvError) => return Ok(self.status()),
            };
            if submission.ply != self.history.len() {
                log::debug!(
                    "discarding stale submission from {} for ply {}",
                    submission.color,
                    submission.ply
                );
                continue;
            }
            self.process(submission)?;
        }
    }

    /// One input round: while the game is on, only the side to move gets a
    /// responder; once terminal, both sides race on one channel and an undo
    /// request from either revives the game.
    fn offer_turn(&self) -> Receiver<Submission> {
        let (sender, receiver) = mpsc::channel();
        let ply = self.history.len();
        let position = self.history.current().clone();
        if self.status().is_ongoing() {
            let color = position.side_to_move();
            let responder = Responder {
                color,
                ply,
                sender,
            };
            self.player_for(color).begin_turn(&position, responder);
        } else {
            for color in [Color::White, Color::Black] {
                let responder = Responder {
                    color,
                    ply,
                    sender: sender.clone(),
                };
                self.player_for(color).begin_turn(&position, responder);
            }
        }
        receiver
    }

    fn process(&mut self, submission: Submission) -> Result<(), EngineFault> {
        match submission.action {
            PlayerAction::RequestUndo => {
                if self.history.undo_full_move() {
                    log::info!("{} took back the last full move", submission.color);
                }
            }
            PlayerAction::Play(mv) => self.apply_move(submission.color, &mv)?,
        }
        self.notify();
        Ok(())
    }

    fn apply_move(&mut self, color: Color, mv: &Move) -> Result<(), EngineFault> {
        if !self.status().is_ongoing() {
            log::debug!("ignoring move {} after the game ended", mv);
            return Ok(());
        }
        let current = self.history.current();
        let side = current.side_to_move();
        let mover = match current.board().piece_at(mv.from) {
            Some(piece) => piece,
            None => {
                log::warn!("rejected {}: no piece on {}", mv, mv.from);
                return Ok(());
            }
        };
        if mover.color != side || color != side {
            log::warn!("rejected {}: it is {}'s turn", mv, side);
            return Ok(());
        }
        if !rules::is_move_valid(mv, current, true) {
            if !self.player_for(color).is_interactive() {
                return Err(EngineFault::IllegalEngineMove(*mv));
            }
            log::warn!("rejected illegal move {}", mv);
            return Ok(());
        }
        let next = current.after_move(mv)?;
        log::debug!("{} played {}", color, mv);
        self.history.push(next);
        Ok(())
    }

    fn notify(&mut self) {
        let position = self.history.current().clone();
        let status = rules::game_status(self.history.positions());
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&position, status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(uci: &str) -> PlayerAction {
        PlayerAction::Play(Move::from_uci(uci).unwrap())
    }

    #[test]
    fn history_never_drops_the_seed() {
        let mut history = History::new(Position::initial());
        assert!(!history.undo_full_move());
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());

        let next = Position::initial()
            .after_move(&Move::from_uci("e2e4").unwrap())
            .unwrap();
        history.push(next.clone());
        assert!(history.undo_full_move());
        assert_eq!(history.len(), 1);

        history.push(next.clone());
        let third = next.after_move(&Move::from_uci("e7e5").unwrap()).unwrap();
        history.push(third);
        assert_eq!(history.len(), 3);
        assert!(history.undo_full_move());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn human_handle_resolves_only_a_pending_turn() {
        let player = HumanPlayer::new();
        let handle = player.handle();
        assert!(!handle.submit_move(Move::from_uci("e2e4").unwrap()));
        assert!(!handle.request_undo());

        let (sender, receiver) = mpsc::channel();
        let responder = Responder {
            color: Color::White,
            ply: 1,
            sender,
        };
        player.begin_turn(&Position::initial(), responder);
        assert!(handle.submit_move(Move::from_uci("e2e4").unwrap()));
        // The responder is spent: a second resolution finds nothing.
        assert!(!handle.request_undo());
        let submission = receiver.recv().unwrap();
        assert_eq!(submission.action, play("e2e4"));
        assert_eq!(submission.ply, 1);
    }

    #[test]
    fn scripted_player_declines_once_exhausted() {
        let player = ScriptedPlayer::interactive([play("e2e4")]);
        let (sender, receiver) = mpsc::channel();
        player.begin_turn(
            &Position::initial(),
            Responder {
                color: Color::White,
                ply: 1,
                sender: sender.clone(),
            },
        );
        assert_eq!(receiver.recv().unwrap().action, play("e2e4"));

        player.begin_turn(
            &Position::initial(),
            Responder {
                color: Color::White,
                ply: 2,
                sender,
            },
        );
        // Script spent, responder dropped: the channel closes.
        assert!(receiver.recv().is_err());
    }

    #[test]
    fn subscribers_can_be_removed() {
        let white = ScriptedPlayer::interactive([play("e2e4")]);
        let black = ScriptedPlayer::interactive([]);
        let mut game = Game::from_initial(Box::new(white), Box::new(black));
        let counter = Arc::new(Mutex::new(0u32));
        let seen = Arc::clone(&counter);
        let id = game.subscribe(Box::new(move |_, _| {
            *lock_ignoring_poison(&seen) += 1;
        }));
        assert!(game.unsubscribe(id));
        assert!(!game.unsubscribe(id));
        game.run().unwrap();
        assert_eq!(*lock_ignoring_poison(&counter), 0);
    }
}
