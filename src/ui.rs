//! Layout and drawing: board, chain, sidebar, game over, clear animation.

use crate::app::Screen;
use crate::game::GameState;
use crate::grid::{Grid, Position};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position as ScreenPos, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per board cell: `[●]` plus a connector column, dot row plus a connector row.
const CELL_WIDTH: u16 = 4;
const CELL_HEIGHT: u16 = 2;

const SIDEBAR_WIDTH: u16 = 24;
const SIDEBAR_HEIGHT: u16 = 17;

const DOT: &str = "●";
const DOT_SELECTED: &str = "◉";

/// Board size in terminal cells, border included.
fn board_outer_size(grid: &Grid) -> (u16, u16) {
    let w = grid.cols() as u16 * CELL_WIDTH + 1;
    let h = grid.rows() as u16 * CELL_HEIGHT - 1;
    (w + 2, h + 2)
}

/// Board (outer) and sidebar rects, centred in `area`.
fn game_areas(area: Rect, grid: &Grid) -> (Rect, Rect) {
    let (pw, ph) = board_outer_size(grid);
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(SIDEBAR_HEIGHT);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    let board = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (board, inner[1])
}

/// Board area inside the border.
fn board_rect(area: Rect, grid: &Grid) -> Rect {
    let (outer, _) = game_areas(area, grid);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: outer.width.saturating_sub(2),
        height: outer.height.saturating_sub(2),
    }
}

/// Top-left terminal cell of a board cell; the dot sits one column to the right.
fn cell_origin(board: Rect, pos: Position) -> (u16, u16) {
    (
        board.x + pos.col as u16 * CELL_WIDTH,
        board.y + pos.row as u16 * CELL_HEIGHT,
    )
}

/// Board cell under a terminal coordinate. Connector rows map to nothing so a
/// drag only registers once it reaches the next dot.
pub fn cell_at(area: Rect, grid: &Grid, x: u16, y: u16) -> Option<Position> {
    let board = board_rect(area, grid);
    if !board.contains(ScreenPos::new(x, y)) {
        return None;
    }
    let (dx, dy) = (x - board.x, y - board.y);
    if dy % CELL_HEIGHT != 0 {
        return None;
    }
    let pos = Position::new((dy / CELL_HEIGHT) as usize, (dx / CELL_WIDTH) as usize);
    grid.contains(pos).then_some(pos)
}

fn put(buf: &mut Buffer, clip: Rect, x: u16, y: u16, symbol: &str, style: Style) {
    if clip.contains(ScreenPos::new(x, y)) {
        buf.set_string(x, y, symbol, style);
    }
}

/// Draw current screen, with the game-over overlay when the game has ended.
/// While a move is pending and animation is on, fades the removal cells and
/// updates `clear_effect` / `clear_process_time`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    cursor: Option<Position>,
    best: u32,
    new_record: bool,
    clear_effect: &mut Option<Effect>,
    clear_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
    clear_ms: u32,
) {
    let area = frame.area();
    draw_game(frame, state, theme, area, cursor, best);
    if state.pending_move().is_some() && !no_animation {
        apply_clear_effect(
            frame,
            state,
            theme,
            area,
            clear_effect,
            clear_process_time,
            now,
            clear_ms,
        );
    }
    if screen == Screen::GameOver {
        draw_game_over(frame, state, theme, area, best, new_record);
    }
}

fn draw_game(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    cursor: Option<Position>,
    best: u32,
) {
    let (board_outer, sidebar) = game_areas(area, state.grid());
    draw_board(frame, state, theme, board_outer, cursor);
    draw_sidebar(frame, state, theme, sidebar, best);
}

fn draw_board(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    outer: Rect,
    cursor: Option<Position>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
        .title(Span::styled(" Dottytui ", theme.title));
    let board = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    let buf = frame.buffer_mut();
    let path = state.selected_dots();
    let selected: HashSet<Position> = path.iter().map(|d| d.pos).collect();
    let pending = state.pending_move();

    // Connectors under the dots.
    if let Some(color) = state.selection().color() {
        let style = Style::default()
            .fg(theme.dot_color(color))
            .bg(theme.bg)
            .add_modifier(Modifier::BOLD);
        for pair in path.windows(2) {
            draw_connector(buf, board, pair[0].pos, pair[1].pos, style);
        }
        if let (Some(info), Some(last)) = (state.selection().closed_loop(), path.last()) {
            draw_connector(buf, board, last.pos, path[info.start].pos, style);
        }
    }

    for dot in state.grid().dots() {
        let (x, y) = cell_origin(board, dot.pos);
        let marked = selected.contains(&dot.pos) || pending.is_some_and(|m| m.contains(dot.pos));
        let mut style = Style::default().fg(theme.dot_color(dot.color)).bg(theme.bg);
        if marked {
            style = style.add_modifier(Modifier::BOLD);
        }
        put(buf, board, x + 1, y, if marked { DOT_SELECTED } else { DOT }, style);
    }

    if let Some(pos) = cursor {
        let (x, y) = cell_origin(board, pos);
        let style = Style::default().fg(theme.cursor).bg(theme.bg);
        put(buf, board, x, y, "[", style);
        put(buf, board, x + 2, y, "]", style);
    }
}

fn draw_connector(buf: &mut Buffer, board: Rect, a: Position, b: Position, style: Style) {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let (x, y) = cell_origin(board, first);
    if first.row == second.row {
        for dx in 2..=CELL_WIDTH {
            put(buf, board, x + dx, y, "─", style);
        }
    } else {
        put(buf, board, x + 1, y + 1, "│", style);
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect, best: u32) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };

    let chain_line = match (state.pending_move(), state.selection().closed_loop()) {
        (Some(m), _) if m.loop_closed => Line::from(Span::styled(
            format!("Loop! +{} ({} inside)", m.len(), m.enclosed.len()),
            Style::default().fg(theme.dot_color(m.color)).add_modifier(Modifier::BOLD),
        )),
        (Some(m), _) => stat("Clearing: ", m.len().to_string()),
        (None, Some(info)) => Line::from(Span::styled(
            "Loop closed",
            Style::default().fg(theme.dot_color(info.color)).add_modifier(Modifier::BOLD),
        )),
        (None, None) => stat("Chain: ", state.selected_dots().len().to_string()),
    };

    let strip: Vec<Span> = (0..state.grid().colors())
        .map(|i| {
            let c = theme.dot_color(crate::grid::DotColor(i));
            Span::styled(format!("{DOT} "), Style::default().fg(c))
        })
        .collect();

    let moves_style = if state.moves_left() <= 3 {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        fg_style
    };

    let lines = vec![
        stat("Score: ", state.score().to_string()),
        Line::from(vec![
            Span::styled("Moves: ", title_style),
            Span::styled(state.moves_left().to_string(), moves_style),
        ]),
        stat("Best:  ", best.to_string()),
        Line::from(""),
        chain_line,
        Line::from(""),
        Line::from(Span::styled("Colours", title_style)),
        Line::from(strip),
        Line::from(""),
        Line::from(Span::styled("Drag with the mouse", fg_style)),
        Line::from(Span::styled("or Space + arrows.", fg_style)),
        Line::from(Span::styled("Enter finish, Esc drop", fg_style)),
        Line::from(Span::styled("N new game, Q quit", fg_style)),
    ];
    Paragraph::new(lines).render(inner, frame.buffer_mut());
}

fn draw_game_over(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    best: u32,
    new_record: bool,
) {
    let popup_w = 30u16;
    let popup_h = if new_record { 10 } else { 9 };
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score()), fg)),
        Line::from(Span::styled(format!(" Best: {} ", best), fg)),
    ];
    if new_record {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" N: new game    Q: quit ", fg)));

    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg))
                .title(Span::styled(" Dottytui ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

/// Buffer positions of the dots about to be cleared.
fn clearing_buffer_positions(board: Rect, cells: &[Position]) -> HashSet<(u16, u16)> {
    cells
        .iter()
        .map(|&pos| {
            let (x, y) = cell_origin(board, pos);
            (x + 1, y)
        })
        .filter(|&(x, y)| board.contains(ScreenPos::new(x, y)))
        .collect()
}

/// Create the clear fade on first use, then advance it by the time since the last frame.
fn apply_clear_effect(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    clear_effect: &mut Option<Effect>,
    clear_process_time: &mut Option<Instant>,
    now: Instant,
    clear_ms: u32,
) {
    let Some(pending) = state.pending_move() else {
        return;
    };
    let board = board_rect(area, state.grid());
    let delta = clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *clear_process_time = Some(now);

    if clear_effect.is_none() {
        let clearing = clearing_buffer_positions(board, &pending.removal);
        let filter = CellFilter::PositionFn(ref_count(move |pos: ScreenPos| {
            clearing.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(theme.bg, theme.bg, (clear_ms, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_6x6() -> Grid {
        let row: &[u8] = &[0; 6];
        Grid::from_rows(&[row; 6], 1)
    }

    #[test]
    fn test_board_size() {
        // 6 columns * 4 + 1, 6 rows * 2 - 1, plus the border.
        assert_eq!(board_outer_size(&grid_6x6()), (27, 13));
    }

    #[test]
    fn test_cell_at_maps_dots_and_skips_connector_rows() {
        let grid = grid_6x6();
        let area = Rect::new(0, 0, 120, 40);
        let board = board_rect(area, &grid);
        let (x, y) = cell_origin(board, Position::new(2, 3));
        assert_eq!(cell_at(area, &grid, x + 1, y), Some(Position::new(2, 3)));
        assert_eq!(cell_at(area, &grid, x, y), Some(Position::new(2, 3)));
        assert_eq!(cell_at(area, &grid, x + 1, y + 1), None);
        assert_eq!(cell_at(area, &grid, board.x + board.width, y), None);
        assert_eq!(cell_at(area, &grid, 0, 0), None);
    }

    #[test]
    fn test_last_column_is_clickable() {
        let grid = grid_6x6();
        let area = Rect::new(0, 0, 120, 40);
        let board = board_rect(area, &grid);
        let (x, y) = cell_origin(board, Position::new(5, 5));
        assert_eq!(cell_at(area, &grid, x + 1, y), Some(Position::new(5, 5)));
    }

    #[test]
    fn test_clearing_positions_hit_dot_columns() {
        let board = Rect::new(10, 5, 25, 11);
        let set = clearing_buffer_positions(board, &[Position::new(0, 0), Position::new(1, 2)]);
        assert!(set.contains(&(11, 5)));
        assert!(set.contains(&(19, 7)));
        assert_eq!(set.len(), 2);
    }
}
