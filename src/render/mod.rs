mod renderer;

pub use renderer::{Cell, Renderer, ScoreTables, board_cells};
