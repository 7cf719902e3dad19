use std::{thread::sleep, time::{Duration, Instant}};

use crate::Coords;
use crate::config::{GameConfig, CELL_CHARS};
use crate::game::{Flow, Game, GameOver, Input, State};
use crate::scores::DEFAULT_CAPACITY;
use crate::snake::Direction::*;
use crate::term::TermManager;

use anyhow::Result;
use crossterm::event::{KeyEvent, KeyModifiers, KeyCode};
use crossterm::style::Color;
use glam::IVec2;
use log::info;

const FRAME_INTERVAL_MS: u64 = 5;
const TITLE: &str = "Path Snake";

const SNAKE_BODY_CELL: &str = "██";
const DEAD_SNAKE_CELL: &str = "XX";
const BERRY_CELL: &str = "()";

const BORDER_COLOR: Color = Color::White;
const SNAKE_COLOR: Color = Color::Magenta;
const BERRY_COLOR: Color = Color::Red;

/// Owns the terminal and drives a `Game` from key presses and the clock.
pub struct App {
    term: TermManager,
    game: Game,
    fps: FrameCounter,
}

impl App {
    pub fn new(term: TermManager, game: Game) -> Self {
        App { term, game, fps: FrameCounter::new(Instant::now()) }
    }

    pub fn run(&mut self) -> Result<()> {
        self.term.setup()?;
        let res = self.play();
        // Hand the terminal back even if the loop failed
        self.term.restore()?;
        res
    }

    ///////////////////////////////////////////////////////////////////////////

    fn play(&mut self) -> Result<()> {
        self.draw()?;

        loop {
            sleep(Duration::from_millis(FRAME_INTERVAL_MS));
            let now = Instant::now();
            let mut dirty = false;

            for key_ev in self.term.read_key_events_queue()? {
                if let Some(input) = to_input(&key_ev) {
                    if self.game.handle_input(input, now) == Flow::Exit {
                        info!("Quitting");
                        return Ok(());
                    }
                    dirty = true;
                }
            }

            // Not more than one tick per frame
            dirty |= self.game.poll_tick(now);

            if dirty {
                self.draw()?;
                self.fps.frame_drawn();
            }

            self.update_title(now)?;
        }
    }

    fn update_title(&mut self, now: Instant) -> Result<()> {
        if let Some(fps) = self.fps.poll(now) {
            self.term.set_title(&format!("{} | FPS: {}", TITLE, fps))?;
            self.term.flush()?;
        }

        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let config = self.game.config().clone();
        let (frame_pos, frame_size) = config.frame();
        let border = config.border();

        self.term.draw_box(frame_pos, frame_size, BORDER_COLOR)?;
        self.term.fill(
            (frame_pos.0 + border, frame_pos.1 + border),
            (frame_size.0 - 2 * border, frame_size.1 - 2 * border),
        )?;

        self.draw_berry(&config)?;
        self.draw_snake(&config)?;
        self.draw_panel((frame_pos.0 + frame_size.0 + 2, frame_pos.1))?;
        self.draw_overlay((frame_pos.0 + frame_size.0 / 2, frame_pos.1 + frame_size.1 / 2))?;

        self.term.flush()?;
        Ok(())
    }

    fn draw_berry(&mut self, config: &GameConfig) -> Result<()> {
        let berry = self.game.berry();
        self.term.print_colored_at(config.grid_to_window(berry), BERRY_CELL, BERRY_COLOR)?;
        Ok(())
    }

    fn draw_snake(&mut self, config: &GameConfig) -> Result<()> {
        let snake = self.game.snake();
        let dead = matches!(self.game.state(), State::GameOver(GameOver { won: false, .. }));
        let head: String = std::iter::repeat(snake.head_char()).take(CELL_CHARS as usize).collect();
        let cells = config.cells();

        for (i, cell) in snake.body_cells().into_iter().enumerate() {
            // The head may already be past the wall when the game ends
            if !in_grid(cell, cells) {
                continue;
            }

            let glyph = if dead {
                DEAD_SNAKE_CELL
            } else if i == 0 {
                head.as_str()
            } else {
                SNAKE_BODY_CELL
            };
            self.term.print_colored_at(config.grid_to_window(cell), glyph, SNAKE_COLOR)?;
        }

        Ok(())
    }

    fn draw_panel(&mut self, origin: Coords) -> Result<()> {
        let lines = [
            TITLE.to_string(),
            String::new(),
            format!("Score: {:>10}", self.game.score()),
            format!("Speed: {:>10}", self.game.speed()),
            format!("Length: {:>9}", self.game.snake().length()),
            String::new(),
            "Control snake: arrows".to_string(),
            "High scores:   S".to_string(),
            "Exit:          X / Esc".to_string(),
        ];

        for (i, line) in lines.iter().enumerate() {
            self.term.print_str_at((origin.0, origin.1 + i as u16), &format!("{:<24}", line))?;
        }

        Ok(())
    }

    fn draw_overlay(&mut self, center: Coords) -> Result<()> {
        if self.game.showing_scores() {
            let mut lines = vec![format!("{:>4}  {:<4} {:>8}", "Pos.", "Name", "Points")];
            for (rank, name, score) in self.game.scores().top_scores(DEFAULT_CAPACITY) {
                lines.push(format!("{:>4}  {:<4} {:>8}", rank, name, score));
            }
            let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
            return Ok(self.term.show_message(center, &lines)?);
        }

        let score_line = format!("Score: {}", self.game.score());
        let lines: Vec<&str> = match self.game.state() {
            State::Idle => vec!["Hit an arrow key", "to start a new game!"],
            State::Running => return Ok(()),
            State::GameOver(over) if over.qualifies => {
                let name = if over.name.is_empty() { "___" } else { over.name.as_str() };
                let title = if over.won { "You won!" } else { "Game Over!" };
                vec![
                    title,
                    "You have a new high score.",
                    "Please type your name and then",
                    "press Enter to continue...",
                    name,
                ]
            }
            State::GameOver(over) => {
                let title = if over.won { "You won!" } else { "Game Over!" };
                vec![title, score_line.as_str(), "", "Press Enter to play again"]
            }
        };

        Ok(self.term.show_message(center, &lines)?)
    }
}

/// Counts drawn frames, reporting the total once a second.
struct FrameCounter {
    frames: u32,
    since: Instant,
}

impl FrameCounter {
    fn new(now: Instant) -> Self {
        FrameCounter { frames: 0, since: now }
    }

    fn frame_drawn(&mut self) {
        self.frames += 1;
    }

    fn poll(&mut self, now: Instant) -> Option<u32> {
        if now.duration_since(self.since) < Duration::from_secs(1) {
            return None;
        }

        let fps = self.frames;
        self.frames = 0;
        self.since = now;
        Some(fps)
    }
}

fn in_grid(cell: IVec2, cells: IVec2) -> bool {
    cell.x >= 0 && cell.y >= 0 && cell.x < cells.x && cell.y < cells.y
}

fn to_input(ev: &KeyEvent) -> Option<Input> {
    if is_ctrl_c(ev) {
        return Some(Input::Quit);
    }

    match ev.code {
        KeyCode::Up => Some(Input::Turn(Up)),
        KeyCode::Down => Some(Input::Turn(Down)),
        KeyCode::Left => Some(Input::Turn(Left)),
        KeyCode::Right => Some(Input::Turn(Right)),
        KeyCode::Enter => Some(Input::Confirm),
        KeyCode::Backspace => Some(Input::Backspace),
        KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char(c) => Some(Input::Char(c)),
        _ => None,
    }
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
