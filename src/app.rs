//! App: terminal init, main loop, key/mouse handling and cascade playback.

use crate::Args;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEventKind};
use nekomatch::{Economy, GameConfig, GameError, GameSession, Grid, Pos, Request, Snapshot, SwapOutcome};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Render loop period (~60 FPS).
const FRAME_MS: u64 = 16;
/// How long the chain banner stays in the sidebar.
const BANNER_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Title,
    Playing,
    Result,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Title,
    Exit,
}

/// A board to show for `hold` before moving on to the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackFrame {
    pub grid: Grid,
    /// Cells about to be cleared (flash + fade).
    pub flash: Vec<Pos>,
    pub hold: Duration,
    /// Sidebar state as of this board.
    pub economy: Economy,
    pub requests: Vec<Request>,
    /// Seconds of time bonus this move has earned but the board has not shown yet.
    pub time_pending: f64,
}

/// Sidebar summary of the last move.
#[derive(Debug, Clone)]
pub struct Banner {
    pub chain: u32,
    pub points: f64,
    pub cats: usize,
    pub shown_at: Instant,
}

/// Turn a move into the boards the player sees, one phase per frame.
///
/// A reverted swap shows the swapped board for half a step. A cascade shows, per pass,
/// the matched cells flashing, the board with them emptied, and the board after gravity;
/// the refilled board is the starting board of the next pass (or the settled board once
/// playback ends). Score and requests change on the emptied board of each pass.
pub fn playback_frames(outcome: &SwapOutcome, before: &Snapshot, step: Duration) -> VecDeque<PlaybackFrame> {
    let mut frames = VecDeque::new();
    match outcome {
        SwapOutcome::Reverted { swapped, .. } => {
            frames.push_back(PlaybackFrame {
                grid: swapped.clone(),
                flash: Vec::new(),
                hold: step / 2,
                economy: before.economy.clone(),
                requests: before.requests.clone(),
                time_pending: 0.0,
            });
        }
        SwapOutcome::Resolved { swapped, steps } => {
            let mut shown = swapped;
            let mut economy = &before.economy;
            let mut requests = &before.requests;
            let mut pending: f64 = steps.iter().map(|s| s.delta.time_gained).sum();
            for s in steps {
                frames.push_back(PlaybackFrame {
                    grid: shown.clone(),
                    flash: s.groups.iter().flat_map(|g| g.cells.iter().copied()).collect(),
                    hold: step,
                    economy: economy.clone(),
                    requests: requests.clone(),
                    time_pending: pending,
                });
                pending -= s.delta.time_gained;
                for grid in [&s.cleared, &s.compacted] {
                    frames.push_back(PlaybackFrame {
                        grid: grid.clone(),
                        flash: Vec::new(),
                        hold: step,
                        economy: s.economy.clone(),
                        requests: s.requests.clone(),
                        time_pending: pending,
                    });
                }
                shown = &s.refilled;
                economy = &s.economy;
                requests = &s.requests;
            }
        }
    }
    frames
}

/// Score, timer and requests to show: those of the playback frame on screen, or the live
/// game once playback is done. The timer keeps running during playback; only the time
/// bonus not yet shown is held back.
fn sidebar_state<'a>(
    session: &'a GameSession,
    playback: &'a VecDeque<PlaybackFrame>,
) -> (Economy, &'a [Request]) {
    let live = session.economy();
    match playback.front() {
        Some(frame) => (
            Economy {
                timer: live.timer - frame.time_pending,
                ..frame.economy.clone()
            },
            frame.requests.as_slice(),
        ),
        None => (live.clone(), session.requests()),
    }
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    session: GameSession,
    screen: Screen,
    cursor: Pos,
    selected: Option<Pos>,
    /// Boards still to show for the last move. Non-empty means busy: no swaps accepted.
    playback: VecDeque<PlaybackFrame>,
    frame_started: Instant,
    last_tick: Instant,
    /// TachyonFX fade for the flashing cells (created when a flash frame starts).
    clear_effect: Option<Effect>,
    /// Last time we processed the fade effect (for delta).
    clear_effect_process_time: Option<Instant>,
    quit_selected: QuitOption,
    banner: Option<Banner>,
    /// Banner for the move being played back; shown once playback ends.
    pending_banner: Option<Banner>,
    best_score: u64,
    new_best: bool,
    /// Frame area of the last draw; mouse clicks are mapped through it.
    last_area: Rect,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let session = GameSession::start_new_game(config.clone(), args.seed)?;
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Title
        };
        let now = Instant::now();
        let center = config.board_size / 2;
        Ok(Self {
            args,
            config,
            theme,
            session,
            screen,
            cursor: Pos::new(center, center),
            selected: None,
            playback: VecDeque::new(),
            frame_started: now,
            last_tick: now,
            clear_effect: None,
            clear_effect_process_time: None,
            quit_selected: QuitOption::Resume,
            banner: None,
            pending_banner: None,
            best_score: 0,
            new_best: false,
            last_area: Rect::default(),
        })
    }

    fn reset_game(&mut self) -> Result<()> {
        self.session = GameSession::start_new_game(self.config.clone(), self.args.seed)?;
        let center = self.config.board_size / 2;
        let now = Instant::now();
        self.screen = Screen::Playing;
        self.cursor = Pos::new(center, center);
        self.selected = None;
        self.playback.clear();
        self.frame_started = now;
        self.last_tick = now;
        self.clear_effect = None;
        self.clear_effect_process_time = None;
        self.banner = None;
        self.pending_banner = None;
        self.new_best = false;
        log::info!("screen -> playing");
        Ok(())
    }

    fn is_busy(&self) -> bool {
        !self.playback.is_empty()
    }

    fn finish_game(&mut self) {
        let score = self.session.economy().display_score();
        self.new_best = score > self.best_score;
        self.best_score = self.best_score.max(score);
        self.playback.clear();
        self.pending_banner = None;
        self.selected = None;
        self.clear_effect = None;
        self.screen = Screen::Result;
        log::info!("screen -> result (score {})", score);
    }

    fn move_cursor(&mut self, action: Action) {
        let max = self.config.board_size - 1;
        let Pos { row, col } = self.cursor;
        self.cursor = match action {
            Action::Up => Pos::new(row.saturating_sub(1), col),
            Action::Down => Pos::new((row + 1).min(max), col),
            Action::Left => Pos::new(row, col.saturating_sub(1)),
            Action::Right => Pos::new(row, (col + 1).min(max)),
            _ => self.cursor,
        };
    }

    /// Pick a tile: first pick marks it, picking it again drops it, picking a neighbour
    /// swaps, picking anything else moves the mark there.
    fn select(&mut self, pos: Pos) {
        if self.is_busy() {
            log::debug!("pick at {} ignored: move still playing", pos);
            return;
        }
        match self.selected {
            None => self.selected = Some(pos),
            Some(prev) if prev == pos => self.selected = None,
            Some(prev) if prev.is_adjacent(pos) => {
                self.selected = None;
                self.swap(prev, pos);
            }
            Some(_) => self.selected = Some(pos),
        }
    }

    fn swap(&mut self, a: Pos, b: Pos) {
        let before = self.session.snapshot();
        match self.session.attempt_swap(a, b) {
            Ok(outcome) => {
                let banner = (!outcome.is_reverted()).then(|| Banner {
                    chain: outcome.max_chain(),
                    points: outcome.total_points(),
                    cats: outcome
                        .steps()
                        .iter()
                        .map(|s| s.delta.satisfied.len())
                        .sum(),
                    shown_at: Instant::now(),
                });
                if self.args.no_animation {
                    if banner.is_some() {
                        self.banner = banner;
                    }
                } else {
                    let step = Duration::from_millis(self.args.step_ms);
                    self.playback = playback_frames(&outcome, &before, step);
                    self.pending_banner = banner;
                    self.frame_started = Instant::now();
                    self.clear_effect = None;
                    self.clear_effect_process_time = None;
                }
            }
            Err(GameError::TimeExpired) => self.finish_game(),
            Err(e) => log::warn!("swap rejected: {}", e),
        }
    }

    fn advance_playback(&mut self, now: Instant) {
        let Some(front) = self.playback.front() else {
            return;
        };
        if now.saturating_duration_since(self.frame_started) >= front.hold {
            self.playback.pop_front();
            self.frame_started = now;
            self.clear_effect = None;
            self.clear_effect_process_time = None;
            if self.playback.is_empty() {
                if let Some(mut banner) = self.pending_banner.take() {
                    banner.shown_at = now;
                    self.banner = Some(banner);
                }
            }
        }
    }



    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();

            if self.screen == Screen::Playing {
                let tick = self.session.tick(now.saturating_duration_since(self.last_tick));
                if tick.expired {
                    self.finish_game();
                }
            }
            // Menus and the result screen do not consume game time.
            self.last_tick = now;

            self.advance_playback(now);
            if self
                .banner
                .as_ref()
                .is_some_and(|b| now.saturating_duration_since(b.shown_at) >= Duration::from_millis(BANNER_MS))
            {
                self.banner = None;
            }

            let (grid, flash) = match self.playback.front() {
                Some(frame) => (&frame.grid, frame.flash.as_slice()),
                None => (self.session.grid(), &[][..]),
            };
            let (economy, requests) = sidebar_state(&self.session, &self.playback);
            let view = View {
                screen: self.screen,
                theme: &self.theme,
                session: &self.session,
                grid,
                flash,
                economy: &economy,
                requests,
                cursor: self.cursor,
                selected: self.selected,
                busy: !self.playback.is_empty(),
                banner: self.banner.as_ref(),
                best_score: self.best_score,
                new_best: self.new_best,
                quit_selected: self.quit_selected,
                fade_ms: self.args.step_ms.min(u32::MAX as u64) as u32,
                no_animation: self.args.no_animation,
                now,
            };
            let mut area = self.last_area;
            terminal.draw(|f| {
                area = f.area();
                ui::draw(
                    f,
                    &view,
                    &mut self.clear_effect,
                    &mut self.clear_effect_process_time,
                );
            })?;
            self.last_area = area;

            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let quit = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.handle_action(key_to_action(key))?
                        }
                        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                            self.handle_click(mouse.column, mouse.row);
                            false
                        }
                        _ => false,
                    };
                    if quit {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn handle_click(&mut self, x: u16, y: u16) {
        if self.screen != Screen::Playing {
            return;
        }
        if let Some(pos) = ui::tile_at(self.last_area, &self.config, x, y) {
            self.cursor = pos;
            self.select(pos);
        }
    }

    /// Returns true when the app should exit.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Title => match action {
                Action::Quit => return Ok(true),
                Action::Select | Action::Restart => self.reset_game()?,
                _ => {}
            },
            Screen::Playing => match action {
                Action::Up | Action::Down | Action::Left | Action::Right => {
                    self.move_cursor(action);
                }
                Action::Select => self.select(self.cursor),
                Action::Cancel => self.selected = None,
                Action::Pause | Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                Action::Restart => self.reset_game()?,
                Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Title,
                        QuitOption::Title => QuitOption::Exit,
                        QuitOption::Exit => QuitOption::Resume,
                    };
                }
                Action::Up | Action::Left => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Exit,
                        QuitOption::Title => QuitOption::Resume,
                        QuitOption::Exit => QuitOption::Title,
                    };
                }
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Title => {
                        self.screen = Screen::Title;
                        log::info!("screen -> title");
                    }
                    QuitOption::Exit => return Ok(true),
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
            Screen::Result => match action {
                Action::Quit => return Ok(true),
                Action::Restart => self.reset_game()?,
                Action::Select => {
                    self.screen = Screen::Title;
                    log::info!("screen -> title");
                }
                _ => {}
            },
        }
        Ok(false)
    }
}
