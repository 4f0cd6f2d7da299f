use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};

use super::{Coord, FoodKind, Phase, StepResult};

/// Terminal columns per board cell, so cells look roughly square.
const CELL_WIDTH: u16 = 2;
const PANEL_WIDTH: u16 = 34;
const ORANGE: Color = Color::Rgb(255, 165, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Head,
    Body,
    Food(FoodKind),
}

impl Tile {
    fn glyph(self) -> char {
        match self {
            Tile::Empty => '.',
            Tile::Head => '@',
            Tile::Body => 'o',
            Tile::Food(FoodKind::Regular) => 'r',
            Tile::Food(FoodKind::Bonus) => 'b',
            Tile::Food(FoodKind::Speed) => 's',
        }
    }

    fn span(self) -> Span<'static> {
        let style = match self {
            Tile::Empty => return Span::raw("  "),
            Tile::Head => Style::default().fg(Color::LightBlue),
            Tile::Body => Style::default().fg(Color::Blue),
            Tile::Food(kind) => Style::default().fg(food_color(kind)),
        };
        Span::styled("██", style)
    }
}

pub fn food_color(kind: FoodKind) -> Color {
    match kind {
        FoodKind::Regular => Color::Red,
        FoodKind::Bonus => Color::Yellow,
        FoodKind::Speed => Color::Magenta,
    }
}

/// One tile per board cell, row-major.
#[derive(Debug, Clone)]
pub struct Raster {
    pub cols: Coord,
    pub rows: Coord,
    pub cells: Vec<Tile>,
}

impl Raster {
    pub fn new(cols: Coord, rows: Coord) -> Self {
        let size = (cols.max(0) * rows.max(0)) as usize;
        Self {
            cols,
            rows,
            cells: vec![Tile::Empty; size],
        }
    }

    #[inline]
    fn idx(&self, col: Coord, row: Coord) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols || row >= self.rows {
            None
        } else {
            Some((row * self.cols + col) as usize)
        }
    }

    pub fn set(&mut self, col: Coord, row: Coord, tile: Tile) {
        if let Some(i) = self.idx(col, row) {
            self.cells[i] = tile;
        }
    }

    pub fn get(&self, col: Coord, row: Coord) -> Option<Tile> {
        self.idx(col, row).map(|i| self.cells[i])
    }

    fn row(&self, row: Coord) -> impl Iterator<Item = Tile> + '_ {
        (0..self.cols).filter_map(move |col| self.get(col, row))
    }
}

impl std::fmt::Display for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = (0..self.rows)
            .map(|row| self.row(row).map(Tile::glyph).collect::<String>())
            .collect::<Vec<String>>()
            .join("\n");
        write!(f, "{text}")
    }
}

/// Lay the step result out on the cell grid. Anything off the board (a head
/// that just went through the wall) is skipped.
pub fn rasterize(res: &StepResult) -> Raster {
    let mut r = Raster::new(res.board.cols(), res.board.rows());
    for food in &res.foods {
        if let Some((col, row)) = res.board.cell_of(food.pos) {
            r.set(col, row, Tile::Food(food.kind));
        }
    }
    // Body before head so the head wins when a collision overlaps them.
    for (i, p) in res.snake.iter().enumerate().rev() {
        if let Some((col, row)) = res.board.cell_of(*p) {
            r.set(col, row, if i == 0 { Tile::Head } else { Tile::Body });
        }
    }
    r
}

/// Draw the whole frame: board, side panel and any phase overlay.
pub fn draw(frame: &mut Frame, res: &StepResult) {
    let raster = rasterize(res);
    let board_w = (raster.cols.max(0) as u16)
        .saturating_mul(CELL_WIDTH)
        .saturating_add(2);
    let board_h = (raster.rows.max(0) as u16).saturating_add(2);

    let [board_area, panel_area] =
        Layout::horizontal([Constraint::Length(board_w), Constraint::Min(PANEL_WIDTH)])
            .areas(frame.area());
    let board_area = Rect {
        height: board_h.min(board_area.height),
        ..board_area
    };

    let lines: Vec<Line> = (0..raster.rows)
        .map(|row| Line::from(raster.row(row).map(Tile::span).collect::<Vec<_>>()))
        .collect();
    let board = Paragraph::new(lines)
        .block(Block::bordered().title(" Greedy Snake ".bold()));
    frame.render_widget(board, board_area);

    let panel = Paragraph::new(panel_lines(res)).block(Block::bordered());
    frame.render_widget(panel, panel_area);

    let screen = frame.area();
    match res.phase {
        Phase::Running => {}
        Phase::WallRecovery { .. } => overlay(
            frame,
            screen,
            vec![Line::from(
                format!("LIFE LOST! ({} remaining)", res.lives)
                    .fg(ORANGE)
                    .bold(),
            )],
            ORANGE,
        ),
        Phase::Paused => overlay(
            frame,
            screen,
            vec![Line::from("PAUSED".bold())],
            Color::White,
        ),
        Phase::GameOver => overlay(
            frame,
            screen,
            vec![
                Line::from("GAME OVER!".red().bold()),
                Line::from("Press R to restart"),
                Line::from(format!("Final Score: {}", res.score)),
            ],
            Color::Red,
        ),
    }
}

fn panel_lines(res: &StepResult) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(format!("Score: {}", res.score).bold())];

    let mut lives = vec![Span::raw("Lives: ")];
    let heart = Style::default().fg(Color::Red);
    lives.extend((0..res.lives).map(|_| Span::styled("♥ ", heart)));
    lines.push(Line::from(lives));

    if res.speed_boost_ticks > 0 {
        // Whole seconds left at the reference pace of ten ticks a second.
        let secs = res.speed_boost_ticks / 10 + 1;
        lines.push(Line::from(format!("Speed Boost: {secs}s").green()));
    }

    lines.push(Line::default());
    for (kind, effect) in [
        (FoodKind::Regular, "Regular: +1 Score"),
        (FoodKind::Bonus, "Bonus: +3 Score"),
        (FoodKind::Speed, "Speed: +1 Score + Speed Boost"),
    ] {
        lines.push(Line::from(vec![
            Tile::Food(kind).span(),
            Span::raw(" "),
            Span::raw(effect),
        ]));
    }

    if res.phase != Phase::GameOver {
        lines.push(Line::default());
        let hint = Style::default().fg(Color::Gray).add_modifier(Modifier::DIM);
        for text in [
            "Arrows or hjkl to move",
            "Space to pause",
            "R to restart",
            "Q or Esc to quit",
        ] {
            lines.push(Line::styled(text, hint));
        }
    }
    lines
}

fn overlay(frame: &mut Frame, over: Rect, lines: Vec<Line<'static>>, color: Color) {
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 4;
    let height = lines.len() as u16 + 2;
    let rect = centered(over, width, height);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::bordered().border_style(Style::default().fg(color))),
        rect,
    );
}

/// A `width` x `height` rectangle centred within `area`, clipped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x.saturating_add(area.width.saturating_sub(width) / 2);
    let y = area.y.saturating_add(area.height.saturating_sub(height) / 2);
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Food, Point, StepEvent};
    use ratatui::{Terminal, backend::TestBackend};

    fn result(phase: Phase) -> StepResult {
        StepResult {
            event: StepEvent::None,
            phase,
            score: 7,
            lives: 2,
            speed: 10,
            speed_boost_ticks: 0,
            snake: vec![Point::new(40, 20), Point::new(20, 20), Point::new(0, 20)],
            foods: vec![
                Food {
                    pos: Point::new(60, 0),
                    kind: FoodKind::Regular,
                },
                Food {
                    pos: Point::new(80, 40),
                    kind: FoodKind::Bonus,
                },
                Food {
                    pos: Point::new(0, 40),
                    kind: FoodKind::Speed,
                },
            ],
            board: Board {
                width: 100,
                height: 60,
                block: 20,
            },
        }
    }

    fn screen(res: &StepResult) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| draw(f, res)).unwrap();
        let buf = terminal.backend().buffer();
        buf.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn rasterizes_snake_and_food() {
        let r = rasterize(&result(Phase::Running));
        assert_eq!(r.to_string(), "...r.\noo@..\ns...b");
    }

    #[test]
    fn off_board_head_is_skipped() {
        let mut res = result(Phase::WallRecovery { ticks_remaining: 3 });
        res.snake.insert(0, Point::new(-20, 20));
        let r = rasterize(&res);
        assert_eq!(r.get(0, 1), Some(Tile::Body));
        assert_eq!(r.cells.iter().filter(|t| **t == Tile::Head).count(), 0);
        assert_eq!(r.get(-1, 1), None);
    }

    #[test]
    fn panel_shows_score_lives_and_legend() {
        let text = screen(&result(Phase::Running));
        assert!(text.contains("Score: 7"));
        assert!(text.contains("Lives: ♥ ♥"));
        assert!(text.contains("Bonus: +3 Score"));
        assert!(text.contains("Space to pause"));
        assert!(!text.contains("Speed Boost:"));
    }

    #[test]
    fn boost_countdown_in_seconds() {
        let mut res = result(Phase::Running);
        res.speed_boost_ticks = 35;
        assert!(screen(&res).contains("Speed Boost: 4s"));
    }

    #[test]
    fn phase_overlays() {
        let text = screen(&result(Phase::WallRecovery { ticks_remaining: 4 }));
        assert!(text.contains("LIFE LOST! (2 remaining)"));

        assert!(screen(&result(Phase::Paused)).contains("PAUSED"));

        let text = screen(&result(Phase::GameOver));
        assert!(text.contains("GAME OVER!"));
        assert!(text.contains("Press R to restart"));
        assert!(text.contains("Final Score: 7"));
        assert!(!text.contains("Space to pause"));
    }
}
