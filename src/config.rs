use crate::geometry::{Area, Transform};
use crate::snake::SNAKE_STARTING_MARGIN;

use glam::{DVec2, IVec2};
use log::debug;
use thiserror::Error;

pub const GRID_SIZE: f64 = 10.0;
pub const BORDER: u16 = 1;
pub const PANEL_WIDTH: u16 = 26;
// Terminal characters are roughly twice as tall as they are wide
pub const CELL_CHARS: u16 = 2;
const MAX_CELLS_X: u16 = 40;
const MAX_CELLS_Y: u16 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("game area {width}x{height} and grid size {grid_size} must all be positive")]
    NonPositive { width: f64, height: f64, grid_size: f64 },
    #[error("game area {width}x{height} must be a multiple of the grid size {grid_size}")]
    NotGridMultiple { width: f64, height: f64, grid_size: f64 },
    #[error("game area of {cols}x{rows} cells is too small, need more than {min} cells each way")]
    TooSmall { cols: i32, rows: i32, min: i32 },
}

/// Immutable description of the playable area and the transforms in and out of grid space.
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    area: Area,
    cells: IVec2,
    border: u16,
    window_origin: (u16, u16),
    grid: Transform,
    window: Transform,
}

impl GameConfig {
    pub fn new(
        width: f64,
        height: f64,
        grid_size: f64,
        border: u16,
        window_origin: (u16, u16),
    ) -> Result<Self, ConfigError> {
        if !(width > 0.0 && height > 0.0 && grid_size > 0.0) {
            return Err(ConfigError::NonPositive { width, height, grid_size });
        }

        if width % grid_size != 0.0 || height % grid_size != 0.0 {
            return Err(ConfigError::NotGridMultiple { width, height, grid_size });
        }

        let cells = IVec2::new((width / grid_size) as i32, (height / grid_size) as i32);
        if cells.x <= SNAKE_STARTING_MARGIN || cells.y <= SNAKE_STARTING_MARGIN {
            return Err(ConfigError::TooSmall { cols: cells.x, rows: cells.y, min: SNAKE_STARTING_MARGIN });
        }

        // Cell centres land on the first character of their on-screen cell, y flipped
        let left = f64::from(window_origin.0 + border);
        let top = f64::from(window_origin.1 + border);
        let char_width = f64::from(CELL_CHARS);
        let window = Transform::new(
            DVec2::new(char_width / grid_size, -1.0 / grid_size),
            DVec2::new(left - char_width / 2.0, top + f64::from(cells.y) - 0.5),
        );

        let config = GameConfig {
            area: Area::new(DVec2::ZERO, DVec2::new(width, height)),
            cells,
            border,
            window_origin,
            grid: Transform::grid(grid_size),
            window,
        };

        debug!("Area dims: {}x{}", width, height);
        debug!("Area cells: {}", config.cells);
        debug!("Border thickness: {}", border);
        debug!("Grid size: {}", grid_size);
        debug!("Grid transform: {:?}", config.grid);
        debug!("Window transform: {:?}", config.window);

        Ok(config)
    }

    /// Largest playable area that fits a terminal of the given size next to the side panel.
    pub fn for_terminal(cols: u16, rows: u16) -> Result<Self, ConfigError> {
        let avail_x = cols.saturating_sub(PANEL_WIDTH + 2 * BORDER) / CELL_CHARS;
        let avail_y = rows.saturating_sub(2 * BORDER);
        let cells_x = avail_x.min(MAX_CELLS_X);
        let cells_y = avail_y.min(MAX_CELLS_Y);

        GameConfig::new(
            f64::from(cells_x) * GRID_SIZE,
            f64::from(cells_y) * GRID_SIZE,
            GRID_SIZE,
            BORDER,
            (0, 0),
        )
    }

    pub fn grid_to_world(&self, p: IVec2) -> DVec2 {
        self.grid.project(p.as_dvec2())
    }

    pub fn world_to_grid(&self, p: DVec2) -> IVec2 {
        self.grid.unproject(p).round().as_ivec2()
    }

    pub fn world_to_window(&self, p: DVec2) -> DVec2 {
        self.window.project(p)
    }

    /// Terminal position of the first character of a grid cell.
    pub fn grid_to_window(&self, p: IVec2) -> (u16, u16) {
        let w = self.world_to_window(self.grid_to_world(p)).round().max(DVec2::ZERO);
        (w.x as u16, w.y as u16)
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn cells(&self) -> IVec2 {
        self.cells
    }

    pub fn border(&self) -> u16 {
        self.border
    }

    /// Top-left corner and outer size, in terminal characters, of the bordered play area.
    pub fn frame(&self) -> ((u16, u16), (u16, u16)) {
        let width = self.cells.x as u16 * CELL_CHARS + 2 * self.border;
        let height = self.cells.y as u16 + 2 * self.border;
        (self.window_origin, (width, height))
    }
}
