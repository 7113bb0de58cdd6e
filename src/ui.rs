//! Layout and drawing: title, board, sidebar (stats, cat requests, chain), result, quit menu.

use crate::app::{Banner, QuitOption, Screen};
use crate::theme::Theme;
use nekomatch::{Economy, GameConfig, GameSession, Grid, Pos, Request, TileKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per tile.
const TILE_W: u16 = 5;
const TILE_H: u16 = 2;
const SIDEBAR_WIDTH: u16 = 28;
/// Timer turns red at or below this many seconds.
const LOW_TIME_SECS: u64 = 10;

/// Everything a frame needs, borrowed from the app.
pub struct View<'a> {
    pub screen: Screen,
    pub theme: &'a Theme,
    pub session: &'a GameSession,
    /// Board on screen: a playback frame, or the session board once playback is done.
    pub grid: &'a Grid,
    pub flash: &'a [Pos],
    /// Sidebar figures matching `grid`.
    pub economy: &'a Economy,
    pub requests: &'a [Request],
    pub cursor: Pos,
    pub selected: Option<Pos>,
    pub busy: bool,
    pub banner: Option<&'a Banner>,
    pub best_score: u64,
    pub new_best: bool,
    pub quit_selected: QuitOption,
    pub fade_ms: u32,
    pub no_animation: bool,
    pub now: Instant,
}

/// Board size in terminal cells, border included.
fn board_pixel_size(n: usize) -> (u16, u16) {
    let n = n as u16;
    (n * TILE_W + 2, n * TILE_H + 2)
}

/// Sidebar height: stats, requests (two lines each), chain, hints, gaps.
fn sidebar_height(queue_size: usize) -> u16 {
    7 + 1 + (2 + 2 * queue_size as u16) + 1 + 5
}

/// Board (outer, with border) and sidebar rects, centred in `area`.
fn game_layout(area: Rect, config: &GameConfig) -> (Rect, Rect) {
    let (pw, ph) = board_pixel_size(config.board_size);
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(sidebar_height(config.queue_size));

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);
    let board = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (board, inner[1])
}

fn board_inner(board_outer: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(board_outer)
}

fn tile_rect(inner: Rect, pos: Pos) -> Rect {
    Rect {
        x: inner.x + pos.col as u16 * TILE_W,
        y: inner.y + pos.row as u16 * TILE_H,
        width: TILE_W,
        height: TILE_H,
    }
}

/// Board position under terminal cell (x, y), if any. Matches the layout used by `draw`.
pub fn tile_at(area: Rect, config: &GameConfig, x: u16, y: u16) -> Option<Pos> {
    let inner = board_inner(game_layout(area, config).0);
    if !inner.contains(Position::new(x, y)) {
        return None;
    }
    let pos = Pos::new(
        ((y - inner.y) / TILE_H) as usize,
        ((x - inner.x) / TILE_W) as usize,
    );
    (pos.row < config.board_size && pos.col < config.board_size).then_some(pos)
}

/// Buffer cells covered by the flashing tiles.
fn clearing_buffer_positions(inner: Rect, cells: &[Pos]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &pos in cells {
        let r = tile_rect(inner, pos);
        for bx in r.x..r.right().min(inner.right()) {
            for by in r.y..r.bottom().min(inner.bottom()) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or advance the fade on the flashing tiles.
fn apply_clear_effect(
    frame: &mut Frame,
    view: &View,
    area: Rect,
    clear_effect: &mut Option<Effect>,
    clear_effect_process_time: &mut Option<Instant>,
) {
    let inner = board_inner(game_layout(area, view.session.config()).0);
    let delta = clear_effect_process_time
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *clear_effect_process_time = Some(view.now);

    if clear_effect.is_none() {
        let clearing_set = clearing_buffer_positions(inner, view.flash);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            clearing_set.contains(&(pos.x, pos.y))
        }));
        let bg = view.theme.bg;
        let effect = fx::fade_to(bg, bg, (view.fade_ms, Interpolation::Linear))
            .with_filter(filter)
            .with_area(inner);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, inner, tfx_delta);
    }
}

/// Draw the current screen.
pub fn draw(
    frame: &mut Frame,
    view: &View,
    clear_effect: &mut Option<Effect>,
    clear_effect_process_time: &mut Option<Instant>,
) {
    let area = frame.area();
    match view.screen {
        Screen::Title => draw_title(frame, view, area),
        Screen::Playing => {
            draw_game(frame, view, area);
            if !view.flash.is_empty() && !view.no_animation {
                apply_clear_effect(frame, view, area, clear_effect, clear_effect_process_time);
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, view, area);
            draw_quit_menu(frame, view);
        }
        Screen::Result => draw_result(frame, view, area),
    }
}

/// Centred popup no larger than `area`.
fn popup_rect(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn swatch(theme: &Theme, kind: TileKind) -> Span<'static> {
    let c = theme.tile_color(kind.color_index());
    Span::styled("██", Style::default().fg(c).bg(c))
}

fn draw_title(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let fg = Style::default().fg(theme.main_fg);
    let legend_line = |kinds: &[TileKind]| {
        let mut spans = Vec::new();
        for &k in kinds {
            spans.push(swatch(theme, k));
            spans.push(Span::styled(format!(" {:<9}", k.name()), fg));
        }
        Line::from(spans)
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " N E K O M A T C H ",
            Style::default().fg(theme.tile_fg).bg(theme.title).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled("Line up three of a kind. Chains pay 1.5x.", fg)),
        Line::from(Span::styled("Every cleared tile feeds the waiting cats.", fg)),
        Line::from(""),
        legend_line(&TileKind::ALL[..3]),
        legend_line(&TileKind::ALL[3..]),
        Line::from(""),
        Line::from(Span::styled(
            "Arrows/hjkl move  Space pick  Mouse click",
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(" Enter — Start    Q — Quit ", fg)),
    ];
    if let Some(seed) = view.session.seed() {
        lines.push(Line::from(Span::styled(
            format!("seed {}", seed),
            Style::default().fg(theme.inactive_fg),
        )));
    }
    let h = lines.len() as u16 + 2;
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup_rect(area, 50, h), frame.buffer_mut());
}

fn draw_game(frame: &mut Frame, view: &View, area: Rect) {
    let (board_area, sidebar_area) = game_layout(area, view.session.config());
    draw_board(frame, view, board_area);
    draw_sidebar(frame, view, sidebar_area);
}

fn draw_board(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let title = match view.selected {
        Some(pos) => format!(" Nekomatch  picked {} ", pos),
        None => " Nekomatch ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let flash: HashSet<Pos> = view.flash.iter().copied().collect();
    let buf = frame.buffer_mut();
    for (pos, tile) in view.grid.iter() {
        let r = tile_rect(inner, pos);
        if r.right() > inner.right() || r.bottom() > inner.bottom() {
            continue;
        }
        let (bg, fg) = match tile {
            Some(_) if flash.contains(&pos) => (Color::White, theme.tile_fg),
            Some(kind) => (theme.tile_color(kind.color_index()), theme.tile_fg),
            None => (theme.bg, theme.inactive_fg),
        };
        let symbol = tile.map_or('·', |k| k.symbol());
        let is_cursor = view.cursor == pos;
        let is_selected = view.selected == Some(pos);
        let label = match (is_cursor, is_selected) {
            (true, true) => format!("[>{}<]", symbol),
            (true, false) => format!("[ {} ]", symbol),
            (false, true) => format!("> {} <", symbol),
            (false, false) => format!("  {}  ", symbol),
        };
        let style = Style::default().fg(fg).bg(bg);
        let style = if is_cursor || is_selected {
            style.bold()
        } else {
            style
        };
        buf.set_string(r.x, r.y, label, style);
        buf.set_string(r.x, r.y + 1, " ".repeat(TILE_W as usize), style);
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let dim_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let session = view.session;
    let economy = view.economy;
    let requests = view.requests;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats (border + score, time, cats, best, moves)
            Constraint::Length(1),
            Constraint::Length(2 + 2 * requests.len() as u16), // Cats (name line + gauge each)
            Constraint::Length(1),
            Constraint::Length(5), // Chain
            Constraint::Fill(1),
        ])
        .split(area);

    // --- Stats ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let timer = economy.display_timer();
    let timer_style = if timer <= LOW_TIME_SECS {
        Style::default().fg(Color::Red).bold()
    } else {
        fg_style
    };
    let score = economy.display_score();
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Time:  ", title_style),
            Span::styled(format!("{}s", timer), timer_style),
        ]),
        Line::from(vec![
            Span::styled("Cats:  ", title_style),
            Span::styled(economy.satisfied.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Best:  ", title_style),
            Span::styled(view.best_score.max(score).to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Moves: ", title_style),
            Span::styled(session.moves().to_string(), fg_style),
        ]),
    ];
    Paragraph::new(Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Cat requests ---
    let cats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Cats waiting ", title_style));
    let cats_inner = cats_block.inner(chunks[2]);
    cats_block.render(chunks[2], frame.buffer_mut());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(requests.iter().flat_map(|_| [Constraint::Length(1), Constraint::Length(1)]))
        .split(cats_inner);
    for (i, req) in requests.iter().enumerate() {
        let color = theme.tile_color(req.kind.color_index());
        let label = Line::from(vec![
            swatch(theme, req.kind),
            Span::styled(format!(" #{:<3} {:<8}", req.id, req.kind.name()), fg_style),
            Span::styled(format!("{:>3} left", req.remaining), title_style),
        ]);
        Paragraph::new(label).render(rows[2 * i], frame.buffer_mut());
        let ratio = if req.quota > 0 {
            (req.progress() as f64 / req.quota as f64).min(1.0)
        } else {
            1.0
        };
        Gauge::default()
            .ratio(ratio)
            .label(format!("{}/{}", req.progress(), req.quota))
            .gauge_style(Style::default().fg(color).bg(theme.bg))
            .render(rows[2 * i + 1], frame.buffer_mut());
    }

    // --- Chain ---
    let chain_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let chain_inner = chain_block.inner(chunks[4]);
    chain_block.render(chunks[4], frame.buffer_mut());
    let chain_lines = match view.banner {
        Some(b) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    if b.chain > 1 {
                        format!("Chain x{}!", b.chain)
                    } else {
                        "Match!".to_string()
                    },
                    title_style.bold(),
                )),
                Line::from(Span::styled(format!("+{}", b.points.floor()), fg_style)),
            ];
            if b.cats > 0 {
                lines.push(Line::from(Span::styled(
                    format!("{} cat{} happy", b.cats, if b.cats == 1 { "" } else { "s" }),
                    Style::default().fg(Color::Yellow),
                )));
            }
            lines
        }
        None if view.busy => vec![Line::from(Span::styled("...", dim_style))],
        None => vec![Line::from(Span::styled("Chain", dim_style))],
    };
    Paragraph::new(Text::from(chain_lines)).render(chain_inner, frame.buffer_mut());

    // --- Hints ---
    let hints = vec![
        Line::from(Span::styled("Space pick/swap  x drop", dim_style)),
        Line::from(Span::styled("P pause  Q menu", dim_style)),
    ];
    Paragraph::new(Text::from(hints)).render(chunks[5], frame.buffer_mut());
}

fn draw_result(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let fg = Style::default().fg(theme.main_fg);
    let economy = view.session.economy();
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Time's up! ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", economy.display_score()), fg)),
        Line::from(Span::styled(format!(" Best: {} ", view.best_score), fg)),
        Line::from(Span::styled(format!(" Cats satisfied: {} ", economy.satisfied), fg)),
        Line::from(Span::styled(format!(" Moves: {} ", view.session.moves()), fg)),
    ];
    if view.new_best {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).bold(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R — Restart   Enter — Title   Q — Quit ",
        fg,
    )));
    lines.push(Line::from(""));
    let h = lines.len() as u16 + 2;
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Nekomatch ", theme.title)),
    );
    p.render(popup_rect(area, 46, h), frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, view: &View) {
    let theme = view.theme;
    let quit_rect = popup_rect(frame.area(), 24, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Paused ");

    // Clear background
    for y in quit_rect.y..quit_rect.bottom() {
        for x in quit_rect.x..quit_rect.right() {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Title, " Title "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == view.quit_selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
