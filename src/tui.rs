//! Terminal read-along view.
//!
//! Draws the current sentence with the spoken word highlighted, a live
//! waveform with a progress marker, and a status line, all driven by one
//! [`NarrationPlayer`]. Input handling funnels every seek through the
//! player's single seek path; the view itself never moves the clock.

use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;

use crate::clock::PlaybackClock;
use crate::playback::{NarrationPlayer, PlayerState};
use crate::waveform::{seek_fraction, WaveformFrame};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25);
const HOVER_STEP: f64 = 0.02;

/// Interactive read-along session over a narration player.
pub struct ReadAlongUi<C: PlaybackClock> {
    player: NarrationPlayer<C>,
    last_frame: Option<WaveformFrame>,
    waveform_area: Rect,
    started: Instant,
}

impl<C: PlaybackClock> ReadAlongUi<C> {
    pub fn new(player: NarrationPlayer<C>) -> Self {
        Self {
            player,
            last_frame: None,
            waveform_area: Rect::default(),
            started: Instant::now(),
        }
    }

    /// Run until the user quits or playback finishes and no key restarts it.
    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        execute!(terminal.backend_mut(), EnableMouseCapture)?;
        terminal.clear()?;

        self.player.play(Instant::now());
        let result = self.event_loop(&mut terminal);

        execute!(terminal.backend_mut(), DisableMouseCapture)?;
        disable_raw_mode()?;
        terminal.clear()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            let now = Instant::now();
            self.player.tick(now);
            let wall = self.started.elapsed().as_secs_f64();
            if let Some(frame) = self.player.render_frame(wall) {
                self.last_frame = Some(frame);
            }

            terminal.draw(|frame| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Min(5),
                        Constraint::Length(10),
                        Constraint::Length(3),
                    ])
                    .margin(1)
                    .split(frame.size());

                self.waveform_area = chunks[1];
                self.draw_reading_view(frame, chunks[0]);
                self.draw_waveform(frame, chunks[1]);
                self.draw_status(frame, chunks[2]);
            })?;

            if event::poll(INPUT_POLL_TIMEOUT)? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        match key.code {
                            KeyCode::Char('q') => return Ok(()),
                            KeyCode::Char(' ') => self.toggle_playback(),
                            KeyCode::Char('s') => self.player.stop(),
                            KeyCode::Left => self.nudge_hover(-HOVER_STEP),
                            KeyCode::Right => self.nudge_hover(HOVER_STEP),
                            KeyCode::Enter => {
                                if let Some(fraction) = self.player.hover() {
                                    self.player.seek_to_fraction(fraction, Instant::now());
                                }
                            }
                            KeyCode::Esc => self.player.clear_hover(),
                            _ => {}
                        }
                    }
                    Event::Mouse(mouse) => {
                        let inner = inner_area(self.waveform_area);
                        match mouse.kind {
                            MouseEventKind::Down(MouseButton::Left) => {
                                if let Some(fraction) = self.fraction_at(inner, mouse.column, mouse.row)
                                {
                                    self.player.seek_to_fraction(fraction, Instant::now());
                                }
                            }
                            MouseEventKind::Moved => {
                                match self.fraction_at(inner, mouse.column, mouse.row) {
                                    Some(fraction) => self.player.set_hover(fraction),
                                    None => self.player.clear_hover(),
                                }
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn toggle_playback(&mut self) {
        match self.player.state() {
            PlayerState::Playing => self.player.pause(),
            _ => self.player.play(Instant::now()),
        }
    }

    fn nudge_hover(&mut self, step: f64) {
        let current = self.player.hover().unwrap_or_else(|| {
            self.last_frame.as_ref().map(|f| f.progress).unwrap_or(0.0)
        });
        self.player.set_hover((current + step).clamp(0.0, 1.0));
    }

    fn fraction_at(&self, inner: Rect, column: u16, row: u16) -> Option<f64> {
        if row < inner.y
            || row >= inner.y + inner.height
            || column < inner.x
            || column >= inner.x + inner.width
        {
            return None;
        }
        Some(seek_fraction(
            f64::from(column - inner.x),
            f64::from(inner.width),
        ))
    }

    fn draw_reading_view(&self, frame: &mut ratatui::Frame, area: Rect) {
        let text = self.player.scheduler().text();
        let sentence_idx = self.player.current_sentence_index();
        let word_idx = self.player.current_word_index();

        let mut lines: Vec<Line> = Vec::new();
        for (i, sentence) in text.sentences.iter().enumerate() {
            let is_current = sentence_idx == Some(i);
            let mut spans: Vec<Span> = Vec::new();
            for w in sentence.start_word..=sentence.end_word {
                let word = &text.words[w];
                let style = if Some(w) == word_idx {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else if is_current {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(word.text.clone(), style));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("Reading").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_waveform(&self, frame: &mut ratatui::Frame, area: Rect) {
        let inner = inner_area(area);
        let mut lines: Vec<Line> = Vec::new();

        if let Some(wave) = &self.last_frame {
            let rows = inner.height.max(1) as usize;
            let marker_col =
                ((wave.progress * wave.bars.len() as f64) as usize).min(wave.bars.len().saturating_sub(1));

            for row in 0..rows {
                // top row is the tallest slice of each bar
                let threshold = (rows - row) as f64 / rows as f64;
                let spans: Vec<Span> = wave
                    .bars
                    .iter()
                    .enumerate()
                    .map(|(i, bar)| {
                        let lit = bar.height >= threshold;
                        let near_marker = i.abs_diff(marker_col) == 1;
                        let style = if i == marker_col {
                            Style::default().fg(Color::White)
                        } else if near_marker {
                            // soft glow either side of the marker
                            Style::default().fg(Color::LightGreen)
                        } else if bar.dimmed {
                            Style::default().fg(Color::DarkGray)
                        } else {
                            Style::default().fg(Color::Green)
                        };
                        let glyph = if i == marker_col {
                            "│"
                        } else if lit {
                            "█"
                        } else {
                            " "
                        };
                        Span::styled(glyph, style)
                    })
                    .collect();
                lines.push(Line::from(spans));
            }
        }

        let title = match self.player.hover() {
            Some(fraction) => format!("Waveform (preview {:.0}%)", fraction * 100.0),
            None => "Waveform".to_string(),
        };
        let paragraph = Paragraph::new(lines)
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn draw_status(&self, frame: &mut ratatui::Frame, area: Rect) {
        let clock = self.player.clock();
        let duration = clock.duration().unwrap_or(0.0);
        let state = match self.player.state() {
            PlayerState::Stopped => "stopped",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Finished => "finished",
        };
        let status = format!(
            "{} {:6.2}s / {:.2}s   space: pause  s: stop  \u{2190}\u{2192}: scrub  enter: seek  q: quit",
            state,
            clock.current_time(),
            duration,
        );
        let paragraph = Paragraph::new(status)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }
}

fn inner_area(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}
