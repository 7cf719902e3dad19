use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use crate::config::GameConfig;
use crate::scores::{ScoreTable, NAME_LEN};
use crate::snake::{Direction, Snake};
use crate::timer::Ticker;

use glam::{DVec2, IVec2};
use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, Rng};

const TICK_POINTS: u32 = 10;
const BERRY_POINTS: u32 = 1000;
// Berries never spawn against the walls
const BERRY_MARGIN: i32 = 1;
const EMPTY_NAME: &str = "???";

#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Idle,
    Running,
    GameOver(GameOver),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameOver {
    pub won: bool,
    pub qualifies: bool,
    pub name: String,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Input {
    Turn(Direction),
    Confirm,
    Backspace,
    Char(char),
    Quit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One play session: the snake, the berry, the score and what the player is doing.
pub struct Game<R = StdRng> {
    config: GameConfig,
    rng: R,
    snake: Snake,
    berry: IVec2,
    score: u32,
    state: State,
    inputs: VecDeque<Direction>,
    ticker: Ticker,
    grow: bool,
    scores: ScoreTable,
    show_scores: bool,
}

impl<R: Rng> Game<R> {
    pub fn new(config: GameConfig, scores: ScoreTable, mut rng: R, now: Instant) -> Self {
        let snake = Snake::random(&config, &mut rng);
        let ticker = Ticker::new(snake.speed(), now);

        let mut game = Game {
            config,
            rng,
            snake,
            berry: IVec2::ZERO,
            score: 0,
            state: State::Idle,
            inputs: VecDeque::new(),
            ticker,
            grow: false,
            scores,
            show_scores: false,
        };
        game.berry = game.place_berry().unwrap_or_default();
        game
    }

    pub fn handle_input(&mut self, input: Input, now: Instant) -> Flow {
        if input == Input::Quit {
            return Flow::Exit;
        }

        match self.state {
            State::Idle => match input {
                Input::Turn(dir) => {
                    self.start(dir, now);
                    Flow::Continue
                }
                other => self.handle_common(other),
            },
            State::Running => match input {
                Input::Turn(dir) => {
                    self.inputs.push_back(dir);
                    Flow::Continue
                }
                other => self.handle_common(other),
            },
            State::GameOver(_) => self.handle_game_over(input, now),
        }
    }

    /// Runs a game tick if one is due. Returns whether anything changed.
    pub fn poll_tick(&mut self, now: Instant) -> bool {
        if self.state != State::Running || !self.ticker.poll(now) {
            return false;
        }

        self.tick(now);
        true
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn berry(&self) -> IVec2 {
        self.berry
    }

    pub fn berry_world(&self) -> DVec2 {
        self.config.grid_to_world(self.berry)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn speed(&self) -> u32 {
        self.snake.speed()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    pub fn showing_scores(&self) -> bool {
        self.show_scores
    }

    ///////////////////////////////////////////////////////////////////////////

    fn handle_common(&mut self, input: Input) -> Flow {
        match input {
            Input::Char('s') | Input::Char('S') => self.show_scores = !self.show_scores,
            Input::Char('x') | Input::Char('X') => return Flow::Exit,
            _ => {}
        }

        Flow::Continue
    }

    fn handle_game_over(&mut self, input: Input, now: Instant) -> Flow {
        let name = match &mut self.state {
            State::GameOver(over) if over.qualifies => Some(&mut over.name),
            _ => None,
        };

        match (input, name) {
            (Input::Confirm, _) => self.finish(now),
            (Input::Backspace, Some(name)) => {
                name.pop();
            }
            (Input::Char(c), Some(name)) => {
                if c.is_ascii_alphanumeric() && name.len() < NAME_LEN {
                    name.push(c.to_ascii_uppercase());
                }
            }
            (other, _) => return self.handle_common(other),
        }

        Flow::Continue
    }

    fn start(&mut self, dir: Direction, now: Instant) {
        self.snake.start_of_game(dir);
        self.inputs.clear();
        self.inputs.push_back(dir);
        self.ticker.set_rate(self.snake.speed(), now);
        self.ticker.fire_now();
        self.show_scores = false;
        self.state = State::Running;
        info!("Game started heading {:?}", self.snake.direction());
    }

    fn tick(&mut self, now: Instant) {
        let dir = self.inputs.pop_front();
        self.snake.update(self.grow, dir);
        self.grow = false;
        debug!(
            "Snake head {} turns {:?} tail {}",
            self.snake.head(),
            self.snake.turn_points().collect::<Vec<_>>(),
            self.snake.tail()
        );

        if !self.snake.check_bounds(&self.config) {
            info!("Snake left the play area at {}", self.snake.head());
            self.game_over(false);
            return;
        }

        if self.snake.check_self_collision() {
            info!("Snake ran into itself at {}", self.snake.head());
            self.game_over(false);
            return;
        }

        let eaten = self.snake.check_eaten(&self.config, self.berry_world());
        if eaten {
            self.grow = true;
            self.snake.increase_speed();
            self.ticker.set_rate(self.snake.speed(), now);
            debug!("Berry eaten, speed now {} ({:?} per tick)", self.snake.speed(), self.ticker.period());
        }

        let speed = self.snake.speed();
        self.score += speed * TICK_POINTS;

        if eaten {
            self.score += speed * BERRY_POINTS;
            match self.place_berry() {
                Some(berry) => self.berry = berry,
                None => self.game_over(true),
            }
        }
    }

    fn game_over(&mut self, won: bool) {
        let qualifies = self.scores.qualifies(self.score);
        info!("Game over with {} points (won: {}, high score: {})", self.score, won, qualifies);

        self.inputs.clear();
        self.state = State::GameOver(GameOver { won, qualifies, name: String::new() });
    }

    fn finish(&mut self, now: Instant) {
        if let State::GameOver(over) = &self.state {
            if over.qualifies {
                let name = if over.name.is_empty() { EMPTY_NAME } else { over.name.as_str() };
                self.scores.add_score(self.score, name);
            }
        }

        self.reset(now);
    }

    fn reset(&mut self, now: Instant) {
        self.snake = Snake::random(&self.config, &mut self.rng);
        self.berry = self.place_berry().unwrap_or_default();
        self.score = 0;
        self.grow = false;
        self.inputs.clear();
        self.ticker = Ticker::new(self.snake.speed(), now);
        self.state = State::Idle;
    }

    fn place_berry(&mut self) -> Option<IVec2> {
        let body: HashSet<IVec2> = self.snake.body_cells().into_iter().collect();
        let cells = self.config.cells();

        let free: Vec<IVec2> = (BERRY_MARGIN..cells.y - BERRY_MARGIN)
            .flat_map(|y| (BERRY_MARGIN..cells.x - BERRY_MARGIN).map(move |x| IVec2::new(x, y)))
            .filter(|p| !body.contains(p))
            .collect();

        let berry = free.choose(&mut self.rng).copied();
        debug!("Berry: {:?}", berry);
        berry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction::*;
    use rand::SeedableRng;
    use std::time::Duration;

    fn game() -> (Game, Instant) {
        let now = Instant::now();
        let config = GameConfig::new(300.0, 200.0, 10.0, 1, (0, 0)).unwrap();
        let mut game = Game::new(config, ScoreTable::in_memory(3), StdRng::seed_from_u64(42), now);
        game.snake = Snake::new(IVec2::new(5, 5), Right);
        game.berry = IVec2::new(20, 15);
        (game, now)
    }

    fn name(game: &Game) -> &str {
        match game.state() {
            State::GameOver(over) => &over.name,
            other => panic!("not game over: {:?}", other),
        }
    }

    #[test]
    fn idle_does_not_tick() {
        let (mut game, now) = game();

        assert!(!game.poll_tick(now + Duration::from_secs(10)));
        assert_eq!(game.snake().head(), IVec2::new(5, 5));
    }

    #[test]
    fn first_key_ticks_immediately() {
        let (mut game, now) = game();

        game.handle_input(Input::Turn(Up), now);
        assert_eq!(game.state(), &State::Running);

        assert!(game.poll_tick(now));
        assert_eq!(game.snake().head(), IVec2::new(5, 6));
        assert_eq!(game.snake().turn_points().collect::<Vec<_>>(), vec![IVec2::new(5, 5)]);
        assert_eq!(game.snake().tail(), IVec2::new(2, 5));
        assert_eq!(game.score(), 20);

        assert!(!game.poll_tick(now + Duration::from_millis(499)));
        assert!(game.poll_tick(now + Duration::from_millis(500)));
    }

    #[test]
    fn reversed_first_key_swaps_ends() {
        let (mut game, now) = game();

        game.handle_input(Input::Turn(Left), now);
        game.poll_tick(now);

        assert_eq!(game.snake().head(), IVec2::new(0, 5));
        assert_eq!(game.snake().tail(), IVec2::new(4, 5));
        assert_eq!(game.state(), &State::Running);
    }

    #[test]
    fn queued_turns_are_used_one_per_tick() {
        let (mut game, now) = game();
        game.handle_input(Input::Turn(Right), now);
        game.handle_input(Input::Turn(Up), now);
        game.handle_input(Input::Turn(Left), now);

        game.tick(now);
        assert_eq!(game.snake().direction(), Right);
        game.tick(now);
        assert_eq!(game.snake().direction(), Up);
        game.tick(now);
        assert_eq!(game.snake().direction(), Left);
        assert_eq!(game.snake().head(), IVec2::new(5, 6));
    }

    #[test]
    fn eating_scores_speeds_up_and_grows() {
        let (mut game, now) = game();
        game.berry = IVec2::new(7, 5);
        game.handle_input(Input::Turn(Right), now);

        game.tick(now);
        assert_eq!(game.score(), 20);

        game.tick(now);
        assert_eq!(game.speed(), 3);
        assert_eq!(game.score(), 20 + 30 + 3000);
        assert_ne!(game.berry(), IVec2::new(7, 5));
        assert!(!game.snake().body_cells().contains(&game.berry()));

        game.berry = IVec2::new(20, 15);
        let tail = game.snake().tail();
        game.tick(now);
        assert_eq!(game.snake().length(), 6);
        assert_eq!(game.snake().tail(), tail);
        assert_eq!(game.score(), 3050 + 30);
    }

    #[test]
    fn speed_up_shortens_the_tick() {
        let (mut game, now) = game();
        game.berry = IVec2::new(6, 5);
        game.handle_input(Input::Turn(Right), now);

        assert!(game.poll_tick(now));
        assert_eq!(game.speed(), 3);
        assert!(!game.poll_tick(now + Duration::from_millis(333)));
        assert!(game.poll_tick(now + Duration::from_millis(334)));
    }

    #[test]
    fn hitting_the_wall_ends_the_game() {
        let (mut game, now) = game();
        game.snake = Snake::new(IVec2::new(28, 5), Right);
        game.handle_input(Input::Turn(Right), now);

        game.tick(now);
        assert_eq!(game.state(), &State::Running);
        game.tick(now);

        assert_eq!(
            game.state(),
            &State::GameOver(GameOver { won: false, qualifies: true, name: String::new() })
        );
        assert_eq!(game.score(), 20);
        assert!(!game.poll_tick(now + Duration::from_secs(5)));
    }

    #[test]
    fn biting_itself_ends_the_game() {
        let (mut game, now) = game();
        game.snake = Snake::new(IVec2::new(10, 10), Right);
        game.handle_input(Input::Turn(Up), now);
        game.handle_input(Input::Turn(Left), now);
        game.handle_input(Input::Turn(Down), now);

        game.tick(now);
        game.tick(now);
        game.tick(now);

        assert!(matches!(game.state(), State::GameOver(GameOver { won: false, .. })));
    }

    #[test]
    fn high_score_name_entry() {
        let (mut game, now) = game();
        game.snake = Snake::new(IVec2::new(28, 5), Right);
        game.handle_input(Input::Turn(Right), now);
        game.tick(now);
        game.tick(now);

        for c in "a-b1c".chars() {
            game.handle_input(Input::Char(c), now);
        }
        assert_eq!(name(&game), "AB1");

        game.handle_input(Input::Backspace, now);
        assert_eq!(name(&game), "AB");

        // Name entry swallows the quit and scores keys
        assert_eq!(game.handle_input(Input::Char('x'), now), Flow::Continue);
        assert_eq!(name(&game), "ABX");

        game.handle_input(Input::Confirm, now);
        assert_eq!(game.state(), &State::Idle);
        assert_eq!(game.score(), 0);
        assert_eq!(game.scores().top_scores(3), vec![(1, "ABX", 20)]);
    }

    #[test]
    fn empty_name_gets_placeholder() {
        let (mut game, now) = game();
        game.snake = Snake::new(IVec2::new(28, 5), Right);
        game.handle_input(Input::Turn(Right), now);
        game.tick(now);
        game.tick(now);

        game.handle_input(Input::Confirm, now);

        assert_eq!(game.scores().top_scores(3), vec![(1, "???", 20)]);
    }

    #[test]
    fn low_score_skips_name_entry() {
        let (mut game, now) = game();
        for score in [500, 600, 700].iter() {
            game.scores.add_score(*score, "TOP");
        }
        game.snake = Snake::new(IVec2::new(28, 5), Right);
        game.handle_input(Input::Turn(Right), now);
        game.tick(now);
        game.tick(now);

        assert!(matches!(game.state(), State::GameOver(GameOver { qualifies: false, .. })));

        game.handle_input(Input::Char('s'), now);
        assert!(game.showing_scores());
        assert_eq!(name(&game), "");

        game.handle_input(Input::Confirm, now);
        assert_eq!(game.state(), &State::Idle);
        assert_eq!(game.scores().len(), 3);
        assert_eq!(game.scores().bottom_score(), 500);
    }

    #[test]
    fn restart_builds_a_fresh_round() {
        let (mut game, now) = game();
        game.snake = Snake::new(IVec2::new(29, 5), Right);
        game.handle_input(Input::Turn(Right), now);
        game.tick(now);
        game.handle_input(Input::Confirm, now);

        assert_eq!(game.state(), &State::Idle);
        assert_eq!(game.snake().length(), 5);
        assert_eq!(game.speed(), 2);
        assert!(game.snake().check_bounds(game.config()));
        assert!(!game.poll_tick(now + Duration::from_secs(1)));
    }

    #[test]
    fn scores_toggle_and_quit_keys() {
        let (mut game, now) = game();

        game.handle_input(Input::Char('s'), now);
        assert!(game.showing_scores());
        game.handle_input(Input::Char('S'), now);
        assert!(!game.showing_scores());

        assert_eq!(game.handle_input(Input::Char('x'), now), Flow::Exit);
        assert_eq!(game.handle_input(Input::Quit, now), Flow::Exit);
        assert_eq!(game.handle_input(Input::Confirm, now), Flow::Continue);
    }

    #[test]
    fn starting_closes_the_score_table() {
        let (mut game, now) = game();

        game.handle_input(Input::Char('s'), now);
        assert!(game.showing_scores());

        game.handle_input(Input::Turn(Up), now);
        assert_eq!(game.state(), &State::Running);
        assert!(!game.showing_scores());
    }

    #[test]
    fn filling_the_board_wins() {
        let now = Instant::now();
        let config = GameConfig::new(110.0, 110.0, 10.0, 1, (0, 0)).unwrap();
        let mut game = Game::new(config, ScoreTable::in_memory(3), StdRng::seed_from_u64(1), now);

        // Snake back and forth over the 9x9 cells berries can use, growing all the way
        let mut snake = Snake::new(IVec2::new(5, 1), Right);
        let mut moves = vec![None; 4];
        for y in 2..=9 {
            let across = if y % 2 == 0 { Left } else { Right };
            moves.push(Some(Up));
            moves.push(Some(across));
            moves.extend(vec![None; 7]);
        }
        moves.pop();
        for dir in moves {
            snake.update(true, dir);
        }
        assert_eq!(snake.head(), IVec2::new(8, 9));
        assert_eq!(snake.body_cells().len(), 80);
        assert!(!snake.check_self_collision());

        game.snake = snake;
        game.berry = IVec2::new(9, 9);
        game.state = State::Running;
        game.grow = true;
        game.tick(now);

        assert!(matches!(game.state(), State::GameOver(GameOver { won: true, qualifies: true, .. })));
        assert_eq!(game.snake().length(), 81);
        assert_eq!(game.score(), 3 * 10 + 3 * 1000);
    }

    #[test]
    fn berries_avoid_walls_and_body() {
        let (mut game, _) = game();
        let cells = game.config().cells();

        for _ in 0..200 {
            let berry = game.place_berry().unwrap();
            assert!(berry.x >= 1 && berry.x < cells.x - 1);
            assert!(berry.y >= 1 && berry.y < cells.y - 1);
            assert!(!game.snake().body_cells().contains(&berry));
        }
    }
}
