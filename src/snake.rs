use std::collections::VecDeque;

use crate::config::GameConfig;
use crate::geometry::segment_cells;
use Direction::*;

use glam::{DVec2, IVec2};
use log::debug;
use rand::Rng;

pub const INITIAL_SNAKE_LENGTH: u32 = 5;
pub const INITIAL_SNAKE_SPEED: u32 = 2;
// Keep a fresh snake this many cells (split across both sides) away from the walls
pub const SNAKE_STARTING_MARGIN: i32 = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Up, Down, Left, Right];

    pub fn vector(self) -> IVec2 {
        match self {
            Up => IVec2::new(0, 1),
            Down => IVec2::new(0, -1),
            Left => IVec2::new(-1, 0),
            Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

/// A snake stored as its head, its tail and the bends in between.
///
/// `turns` is ordered newest first. The body is the polyline
/// `head -> turns[0] -> ... -> turns[n - 1] -> tail`, all in grid cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Snake {
    head: IVec2,
    tail: IVec2,
    length: u32,
    speed: u32,
    direction: Direction,
    turns: VecDeque<IVec2>,
}

impl Snake {
    /// A straight snake of the initial length with its head at `head`, travelling `direction`.
    pub fn new(head: IVec2, direction: Direction) -> Self {
        let length = INITIAL_SNAKE_LENGTH;
        let tail = head - direction.vector() * (length as i32 - 1);

        Snake { head, tail, length, speed: INITIAL_SNAKE_SPEED, direction, turns: VecDeque::new() }
    }

    /// A snake at a random cell clear of the walls, heading a random way.
    pub fn random<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Self {
        let cells = config.cells();
        let half_margin = SNAKE_STARTING_MARGIN / 2;
        let head = IVec2::new(
            rng.gen_range(0..cells.x - SNAKE_STARTING_MARGIN) + half_margin,
            rng.gen_range(0..cells.y - SNAKE_STARTING_MARGIN) + half_margin,
        );
        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];

        debug!("New snake at {} heading {:?}", head, direction);
        Snake::new(head, direction)
    }

    /// First input of a game. Asking for the reverse of the current heading turns the
    /// snake around by swapping its ends instead of being ignored.
    pub fn start_of_game(&mut self, dir: Direction) {
        if dir.is_opposite(self.direction) {
            std::mem::swap(&mut self.head, &mut self.tail);
            self.direction = dir;
        }
    }

    /// Advances the snake one cell. `eaten` grows it by one instead of moving the tail.
    pub fn update(&mut self, eaten: bool, dir: Option<Direction>) {
        if eaten {
            self.length += 1;
        }

        if let Some(dir) = dir {
            if dir != self.direction && !dir.is_opposite(self.direction) {
                self.direction = dir;
                self.turns.push_front(self.head);
            }
        }

        // The tail has caught up with the oldest bend
        if self.turns.back() == Some(&self.tail) {
            self.turns.pop_back();
        }

        self.head += self.direction.vector();

        if !eaten {
            let step = match self.turns.back() {
                Some(&bend) => (bend - self.tail).signum(),
                None => self.direction.vector(),
            };
            self.tail += step;
        }
    }

    /// False once the head has left the playable area.
    pub fn check_bounds(&self, config: &GameConfig) -> bool {
        config.area().contains(config.grid_to_world(self.head))
    }

    pub fn check_self_collision(&self) -> bool {
        let vertices: Vec<IVec2> = self.turns.iter().copied().chain(Some(self.tail)).collect();

        vertices
            .windows(2)
            .any(|seg| segment_cells(seg[0], seg[1]).any(|cell| cell == self.head))
    }

    /// `berry` is in world coordinates.
    pub fn check_eaten(&self, config: &GameConfig, berry: DVec2) -> bool {
        config.world_to_grid(berry) == self.head
    }

    pub fn increase_speed(&mut self) {
        self.speed += 1;
    }

    pub fn head(&self) -> IVec2 {
        self.head
    }

    pub fn tail(&self) -> IVec2 {
        self.tail
    }

    pub fn turn_points(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.turns.iter().copied()
    }

    /// Head, bends and tail in body order.
    pub fn vertices(&self) -> impl Iterator<Item = IVec2> + '_ {
        Some(self.head).into_iter().chain(self.turn_points()).chain(Some(self.tail))
    }

    /// Every cell covered by the body, head first. Corners appear once.
    pub fn body_cells(&self) -> Vec<IVec2> {
        let vertices: Vec<IVec2> = self.vertices().collect();
        let mut cells = vec![self.head];

        for seg in vertices.windows(2) {
            cells.extend(segment_cells(seg[0], seg[1]).skip(1));
        }

        cells
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn head_char(&self) -> char {
        match self.direction {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}
