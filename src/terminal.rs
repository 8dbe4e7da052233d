//! Interactive terminal host: half-block rendering, input, resize and page navigation.

use std::io::{self, IsTerminal, Stdout, Write};
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use anyhow::Context;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, BeginSynchronizedUpdate, ClearType, DisableLineWrap, EnableLineWrap,
    EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute, queue};
use tracing::{debug, info};

use crate::artifact::{PointerEvent, PointerKind};
use crate::assets::{AssetStore, SceneAssets};
use crate::config::Cli;
use crate::display::{DisplayError, FrameSink};
use crate::geometry::{SceneKind, Viewport};
use crate::graphics::Canvas;
use crate::math::Point;
use crate::nav::NavPanel;
use crate::scheduler::{FrameScheduler, LoopHandle, ScenePipeline, VsyncClock};
use crate::scroll::{ScrollMetrics, ScrollSource, SyntheticScroll, PAGE_VIEWPORTS};

const UPPER_HALF: char = '▀';
const NAV_FG: Color = Color::Rgb { r: 0, g: 255, b: 204 };
const NAV_BG: Color = Color::Rgb { r: 0, g: 0, b: 0 };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    /// Never equal to a drawn cell, so the next diff repaints everything
    const STALE: Cell = Cell {
        ch: '\0',
        fg: Color::Reset,
        bg: Color::Reset,
    };
}

/// Text drawn over the picture
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub fg: Color,
    pub bg: Color,
}

/// Canvas size for a terminal: each cell is `scale` pixels wide and two
/// square half-blocks tall
pub fn canvas_viewport(cols: u16, rows: u16, scale: u32) -> Viewport {
    Viewport::new(
        (cols as u32).saturating_mul(scale),
        (rows as u32).saturating_mul(2).saturating_mul(scale),
    )
}

/// Canvas pixel at the middle of a cell
pub fn cell_center(col: u16, row: u16, scale: u32) -> Point {
    let s = scale as f64;
    Point::new((col as f64 + 0.5) * s, (row as f64 + 0.5) * 2.0 * s)
}

fn block_average(canvas: &Canvas, x0: usize, y0: usize, size: usize) -> Color {
    let (mut r, mut g, mut b, mut n) = (0u32, 0u32, 0u32, 0u32);
    for y in y0..(y0 + size).min(canvas.height()) {
        for x in x0..(x0 + size).min(canvas.width()) {
            let [pr, pg, pb, pa] = canvas.pixel(x, y);
            let a = pa as u32;
            r += pr as u32 * a / 255;
            g += pg as u32 * a / 255;
            b += pb as u32 * a / 255;
            n += 1;
        }
    }
    if n == 0 {
        return Color::Rgb { r: 0, g: 0, b: 0 };
    }
    Color::Rgb {
        r: (r / n) as u8,
        g: (g / n) as u8,
        b: (b / n) as u8,
    }
}

/// Downsamples the canvas into half-block cells: foreground is the upper
/// half, background the lower one
pub fn rasterize_cells(canvas: &Canvas, cols: u16, rows: u16, scale: u32) -> Vec<Cell> {
    let s = scale.max(1) as usize;
    let mut cells = Vec::with_capacity(cols as usize * rows as usize);
    for row in 0..rows as usize {
        for col in 0..cols as usize {
            let x = col * s;
            let y = row * 2 * s;
            cells.push(Cell {
                ch: UPPER_HALF,
                fg: block_average(canvas, x, y, s),
                bg: block_average(canvas, x, y + s, s),
            });
        }
    }
    cells
}

pub fn apply_overlay(cells: &mut [Cell], cols: u16, rows: u16, overlay: &[Overlay]) {
    for text in overlay.iter().filter(|t| t.row < rows) {
        for (i, ch) in text.text.chars().enumerate() {
            let col = text.col as usize + i;
            if col >= cols as usize {
                break;
            }
            cells[text.row as usize * cols as usize + col] = Cell {
                ch,
                fg: text.fg,
                bg: text.bg,
            };
        }
    }
}

fn render_diff(out: &mut Stdout, cols: u16, prev: &mut [Cell], cur: &[Cell]) -> io::Result<()> {
    let mut fg = Color::Reset;
    let mut bg = Color::Reset;
    for (i, cell) in cur.iter().enumerate() {
        if prev[i] == *cell {
            continue;
        }
        prev[i] = *cell;
        let (x, y) = ((i % cols as usize) as u16, (i / cols as usize) as u16);
        queue!(out, cursor::MoveTo(x, y))?;
        if cell.bg != bg {
            bg = cell.bg;
            queue!(out, SetBackgroundColor(bg))?;
        }
        if cell.fg != fg {
            fg = cell.fg;
            queue!(out, SetForegroundColor(fg))?;
        }
        queue!(out, Print(cell.ch))?;
    }
    Ok(())
}

/// The terminal as a display. Restores the terminal when dropped.
pub struct TerminalSurface {
    out: Stdout,
    cols: u16,
    rows: u16,
    scale: u32,
    prev: Vec<Cell>,
    overlay: Vec<Overlay>,
}

impl TerminalSurface {
    /// Switches to the alternate screen in raw mode with mouse capture
    pub fn enter(cols: u16, rows: u16, scale: u32) -> Result<Self, DisplayError> {
        let mut surface = TerminalSurface {
            out: io::stdout(),
            cols,
            rows,
            scale,
            prev: Vec::new(),
            overlay: Vec::new(),
        };
        terminal::enable_raw_mode()?;
        execute!(
            surface.out,
            EnterAlternateScreen,
            EnableMouseCapture,
            DisableLineWrap,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;
        surface.prev = vec![Cell::STALE; cols as usize * rows as usize];
        Ok(surface)
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn viewport(&self) -> Viewport {
        canvas_viewport(self.cols, self.rows, self.scale)
    }

    pub fn cell_to_pixel(&self, col: u16, row: u16) -> Point {
        cell_center(col, row, self.scale)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.prev = vec![Cell::STALE; cols as usize * rows as usize];
    }

    pub fn set_overlay(&mut self, overlay: Vec<Overlay>) {
        self.overlay = overlay;
    }
}

impl FrameSink for TerminalSurface {
    fn present(&mut self, canvas: &Canvas) -> Result<(), DisplayError> {
        if canvas.width() == 0 || canvas.height() == 0 {
            return Err(DisplayError::EmptyFrame {
                width: canvas.width(),
                height: canvas.height(),
            });
        }
        let mut cells = rasterize_cells(canvas, self.cols, self.rows, self.scale);
        apply_overlay(&mut cells, self.cols, self.rows, &self.overlay);
        if self.prev.len() != cells.len() {
            self.prev = vec![Cell::STALE; cells.len()];
        }
        queue!(self.out, BeginSynchronizedUpdate)?;
        render_diff(&mut self.out, self.cols, &mut self.prev, &cells)?;
        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

pub enum AppEvent {
    AssetsSettled(SceneAssets),
}

enum Flow {
    Continue,
    Quit,
}

fn scroll_source(eased: bool, viewport_height: f64) -> Box<dyn ScrollSource> {
    if eased {
        Box::new(SyntheticScroll::new(viewport_height))
    } else {
        Box::new(ScrollMetrics::for_viewport(viewport_height))
    }
}

fn nav_overlay(nav: &NavPanel) -> Vec<Overlay> {
    nav.rows()
        .iter()
        .map(|r| Overlay {
            col: r.col,
            row: r.row,
            text: r.label.clone(),
            fg: NAV_FG,
            bg: NAV_BG,
        })
        .collect()
}

struct App {
    seed: Option<u64>,
    code: String,
    eased: bool,
    refresh_hz: u32,
    scheduler: FrameScheduler,
    handle: LoopHandle,
    pipeline: ScenePipeline,
    scroll: Box<dyn ScrollSource>,
    canvas: Canvas,
    nav: NavPanel,
    assets: SceneAssets,
}

impl App {
    fn new(cli: &Cli, viewport: Viewport, assets: SceneAssets) -> Self {
        let mut scheduler = FrameScheduler::new();
        let handle = scheduler.start();
        App {
            seed: cli.seed,
            code: cli.constellation_code.clone(),
            eased: cli.eased_scroll,
            refresh_hz: cli.refresh_hz,
            pipeline: ScenePipeline::new(
                cli.page,
                viewport,
                &assets,
                cli.seed,
                &cli.constellation_code,
            ),
            scroll: scroll_source(cli.eased_scroll, viewport.h()),
            canvas: Canvas::new(viewport.width as usize, viewport.height as usize),
            nav: NavPanel::new(cli.page),
            scheduler,
            handle,
            assets,
        }
    }

    fn run(
        &mut self,
        surface: &mut TerminalSurface,
        events: &Receiver<AppEvent>,
    ) -> anyhow::Result<()> {
        let mut clock = VsyncClock::new(self.refresh_hz, Instant::now());
        while self.handle.is_active() {
            for event in events.try_iter() {
                match event {
                    AppEvent::AssetsSettled(assets) => {
                        info!(loaded = assets.count(), "regenerating with settled assets");
                        self.assets = assets;
                        self.pipeline.regenerate(&self.assets);
                    }
                }
            }

            self.pipeline.render_frame(&mut self.canvas, self.scroll.as_mut());
            self.nav
                .sync(self.pipeline.artifact().is_open(), surface.cols(), surface.rows());
            surface.set_overlay(nav_overlay(&self.nav));
            surface.present(&self.canvas)?;

            loop {
                let remaining = clock.remaining(Instant::now());
                if remaining.is_zero() || !event::poll(remaining)? {
                    break;
                }
                if let Flow::Quit = self.handle_event(event::read()?, surface) {
                    self.scheduler.stop();
                    info!(frames = self.pipeline.frame(), "quitting");
                    return Ok(());
                }
            }
            clock.tick(Instant::now());
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event, surface: &mut TerminalSurface) -> Flow {
        let page = self.pipeline.viewport().h();
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                modifiers,
                ..
            }) => match code {
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Flow::Quit
                }
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Down => self.scroll.scroll_by(page * 0.05),
                KeyCode::Up => self.scroll.scroll_by(-page * 0.05),
                KeyCode::PageDown => self.scroll.scroll_by(page * 0.9),
                KeyCode::PageUp => self.scroll.scroll_by(-page * 0.9),
                KeyCode::Home => self.scroll.scroll_by(-page * PAGE_VIEWPORTS),
                KeyCode::End => self.scroll.scroll_by(page * PAGE_VIEWPORTS),
                KeyCode::Char(c) => {
                    if self.pipeline.sky_mut().key(c) {
                        info!("constellation code entered");
                    }
                }
                _ => {}
            },
            Event::Mouse(MouseEvent {
                kind, column, row, ..
            }) => match kind {
                MouseEventKind::ScrollDown => self.scroll.scroll_by(page * 0.1),
                MouseEventKind::ScrollUp => self.scroll.scroll_by(-page * 0.1),
                MouseEventKind::Down(MouseButton::Left) => self.click(column, row, surface),
                _ => {}
            },
            Event::Resize(cols, rows) => self.resize(cols, rows, surface),
            _ => {}
        }
        Flow::Continue
    }

    fn click(&mut self, column: u16, row: u16, surface: &TerminalSurface) {
        let link = self.nav.hit(column, row);
        let event = PointerEvent {
            position: surface.cell_to_pixel(column, row),
            kind: PointerKind::Click,
            on_nav_link: link.is_some(),
            at: Instant::now(),
        };
        self.pipeline.artifact_mut().handle_pointer(&event);
        if let Some(kind) = link {
            self.navigate(kind);
        }
    }

    /// Tears the page down and starts a fresh pipeline for `kind`
    fn navigate(&mut self, kind: SceneKind) {
        info!(from = %self.pipeline.kind(), to = %kind, "navigating");
        let viewport = self.pipeline.viewport();
        self.pipeline = ScenePipeline::new(kind, viewport, &self.assets, self.seed, &self.code);
        self.scroll = scroll_source(self.eased, viewport.h());
        self.nav.set_current(kind);
        self.handle = self.scheduler.start();
    }

    fn resize(&mut self, cols: u16, rows: u16, surface: &mut TerminalSurface) {
        if cols == 0 || rows == 0 {
            debug!(cols, rows, "ignoring empty resize");
            return;
        }
        surface.resize(cols, rows);
        let viewport = surface.viewport();
        self.canvas.resize(viewport.width as usize, viewport.height as usize);
        self.pipeline.resize(viewport, &self.assets);
        self.scroll.resize(viewport.h());
    }
}

/// Runs the interactive app until the user quits. Without a terminal there is
/// nothing to draw on, which is not an error.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    if !io::stdout().is_terminal() {
        info!("stdout is not a terminal, nothing to render");
        return Ok(());
    }
    let Some(size) = termsize::get().filter(|s| s.cols > 0 && s.rows > 0) else {
        info!("terminal size unavailable, nothing to render");
        return Ok(());
    };

    let (tx, rx) = mpsc::channel();
    let store = AssetStore::new();
    let _load = store.load_all(cli.manifest(), move |settled| {
        if tx.send(AppEvent::AssetsSettled(settled.clone())).is_err() {
            debug!("render loop ended before assets settled");
        }
    });

    let mut surface = TerminalSurface::enter(size.cols, size.rows, cli.scale)
        .context("failed to set up the terminal")?;
    info!(page = %cli.page, viewport = %surface.viewport(), "starting");
    let mut app = App::new(cli, surface.viewport(), store.snapshot());
    app.run(&mut surface, &rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_viewport_uses_square_half_blocks() {
        assert_eq!(canvas_viewport(80, 24, 6), Viewport::new(480, 288));
        let huge = canvas_viewport(u16::MAX, u16::MAX, u32::MAX);
        assert_eq!(huge, Viewport::new(u32::MAX, u32::MAX));
        let p = cell_center(0, 0, 6);
        assert_eq!((p.x, p.y), (3.0, 6.0));
    }

    #[test]
    fn test_rasterize_splits_halves() {
        let mut canvas = Canvas::new(4, 8);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, crate::color::Rgb::new(200, 100, 50));
        canvas.fill_rect(0.0, 4.0, 4.0, 4.0, crate::color::Rgb::new(10, 20, 30));
        let cells = rasterize_cells(&canvas, 1, 1, 4);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].ch, UPPER_HALF);
        assert_eq!(cells[0].fg, Color::Rgb { r: 200, g: 100, b: 50 });
        assert_eq!(cells[0].bg, Color::Rgb { r: 10, g: 20, b: 30 });
    }

    #[test]
    fn test_transparent_pixels_read_as_black() {
        let canvas = Canvas::new(6, 12);
        let cells = rasterize_cells(&canvas, 1, 1, 6);
        assert_eq!(cells[0].fg, Color::Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn test_overlay_clips_to_screen() {
        let canvas = Canvas::new(8, 4);
        let mut cells = rasterize_cells(&canvas, 4, 1, 2);
        let overlay = [Overlay {
            col: 2,
            row: 0,
            text: "URBAN".to_string(),
            fg: NAV_FG,
            bg: NAV_BG,
        }];
        apply_overlay(&mut cells, 4, 1, &overlay);
        assert_eq!(cells[2].ch, 'U');
        assert_eq!(cells[3].ch, 'R');
        assert_eq!(cells[1].ch, UPPER_HALF);
    }
}
