use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::time::Duration;
use tracing::debug;

use super::braille::BrailleCanvas;
use crate::color::ColorScheme;
use crate::config::{Config, RemapConfig};
use crate::geometry::Vec2;
use crate::grid::SampleGrid;
use crate::renderer::scatter::{normalized_points, proximity};

const FOCAL_STEP: f64 = 0.02;
const RADIUS_STEP: f64 = 0.005;
const FACTOR_STEP: f64 = 0.25;

/// Interactive state of the grid preview.
pub struct PreviewState {
    pub remap: RemapConfig,
    pub color_scheme: ColorScheme,
    pub grid: SampleGrid,
    pub error: Option<String>,
}

impl PreviewState {
    pub fn new(config: &Config) -> Self {
        let mut state = Self {
            remap: config.remap.clone(),
            color_scheme: config.preview.color_scheme,
            grid: SampleGrid::normalized(config.remap.width, config.remap.height),
            error: None,
        };
        state.recompute();
        state
    }

    /// Remap a fresh grid. On degenerate parameters the previous grid is kept.
    pub fn recompute(&mut self) {
        let mut grid = super::uniform_grid(&self.remap);
        match grid.remap(self.remap.focal(), self.remap.strategy, &self.remap.params()) {
            Ok(()) => {
                self.grid = grid;
                self.error = None;
            }
            Err(e) => {
                debug!("Keeping previous grid: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn move_focal(&mut self, dx: f64, dy: f64) {
        let focal = self.remap.focal() + Vec2::new(dx, dy);
        self.remap
            .set_focal(Vec2::new(focal.x.clamp(0.0, 1.0), focal.y.clamp(0.0, 1.0)));
        self.recompute();
    }

    pub fn adjust_radius(&mut self, delta: f64) {
        self.remap.radius = (self.remap.radius + delta).max(0.0);
        self.recompute();
    }

    pub fn adjust_density(&mut self, delta: f64) {
        self.remap.density_factor = (self.remap.density_factor + delta).max(0.0);
        self.recompute();
    }

    pub fn next_strategy(&mut self) {
        self.remap.strategy = self.remap.strategy.next();
        self.recompute();
    }

    /// Returns false when the key asks to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key {
            KeyEvent {
                code: KeyCode::Char('q'),
                ..
            }
            | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => return false,
            KeyEvent {
                code: KeyCode::Char('c'),
                ..
            } => self.color_scheme = self.color_scheme.next(),
            KeyEvent {
                code: KeyCode::Char('s'),
                ..
            } => self.next_strategy(),
            KeyEvent {
                code: KeyCode::Left, ..
            } => self.move_focal(-FOCAL_STEP, 0.0),
            KeyEvent {
                code: KeyCode::Right,
                ..
            } => self.move_focal(FOCAL_STEP, 0.0),
            KeyEvent {
                code: KeyCode::Up, ..
            } => self.move_focal(0.0, FOCAL_STEP),
            KeyEvent {
                code: KeyCode::Down,
                ..
            } => self.move_focal(0.0, -FOCAL_STEP),
            KeyEvent {
                code: KeyCode::Char('+'),
                ..
            } => self.adjust_radius(RADIUS_STEP),
            KeyEvent {
                code: KeyCode::Char('-'),
                ..
            } => self.adjust_radius(-RADIUS_STEP),
            KeyEvent {
                code: KeyCode::Char(']'),
                ..
            } => self.adjust_density(FACTOR_STEP),
            KeyEvent {
                code: KeyCode::Char('['),
                ..
            } => self.adjust_density(-FACTOR_STEP),
            _ => {}
        }
        true
    }

    fn status_line(&self) -> String {
        let focal = self.remap.focal();
        let mut status = format!(
            " [s]trategy: {} | focal ({:.2}, {:.2}) | radius {:.3} [+/-] | factor {:.2} [[/]] | [c]olor: {} | [q]uit ",
            self.remap.strategy,
            focal.x,
            focal.y,
            self.remap.radius,
            self.remap.density_factor,
            self.color_scheme.name(),
        );
        if let Some(err) = &self.error {
            status.push_str(&format!("| {} ", err));
        }
        status
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let block = ratatui::widgets::Block::default().style(Style::default().bg(Color::Reset));
        frame.render_widget(block, area);

        if area.height < 2 || area.width == 0 {
            return;
        }
        let plot = Rect::new(area.x, area.y + 1, area.width, area.height - 1);

        let mut canvas = BrailleCanvas::new(plot.width as usize, plot.height as usize);
        for p in normalized_points(&self.grid) {
            canvas.plot(p);
        }

        let focal = self.remap.focal();
        let (cw, ch) = (plot.width as f64, plot.height as f64);
        canvas.render(frame, plot, |cx, cy| {
            let center = Vec2::new((cx as f64 + 0.5) / cw, 1.0 - (cy as f64 + 0.5) / ch);
            self.color_scheme.ramp(proximity(center, focal))
        });

        let color = if self.error.is_some() {
            Color::Red
        } else {
            Color::DarkGray
        };
        for (i, c) in self.status_line().chars().enumerate() {
            if i >= area.width as usize {
                break;
            }
            if let Some(cell) = frame.buffer_mut().cell_mut((area.x + i as u16, area.y)) {
                cell.set_char(c);
                cell.set_fg(color);
            }
        }
    }
}

pub async fn run(config: Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, config: &Config) -> Result<()> {
    let mut state = PreviewState::new(config);
    let poll_interval = Duration::from_millis(100);

    loop {
        terminal.draw(|frame| state.render(frame))?;

        if event::poll(poll_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if !state.handle_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}
