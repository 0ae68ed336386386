// 🖥️ Copy Overlay - shown when the CSV cannot be saved
// Full-screen, scrollable, dismissed with q / Esc

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;

use crate::export::COPY_HEADING;

const PAGE: usize = 20;

pub struct CopyOverlay {
    pub lines: Vec<String>,
    pub scroll: usize,
}

impl CopyOverlay {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            scroll: 0,
        }
    }

    fn last_line(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn scroll_down(&mut self) {
        if self.scroll < self.last_line() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn page_down(&mut self) {
        self.scroll = (self.scroll + PAGE).min(self.last_line());
    }

    pub fn page_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(PAGE);
    }

    pub fn home(&mut self) {
        self.scroll = 0;
    }

    pub fn end(&mut self) {
        self.scroll = self.last_line();
    }
}

pub fn run_copy_overlay(text: &str) -> Result<()> {
    let mut overlay = CopyOverlay::new(text);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_overlay(&mut terminal, &mut overlay);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_overlay<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    overlay: &mut CopyOverlay,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, overlay))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => overlay.scroll_down(),
                KeyCode::Up | KeyCode::Char('k') => overlay.scroll_up(),
                KeyCode::PageDown => overlay.page_down(),
                KeyCode::PageUp => overlay.page_up(),
                KeyCode::Home => overlay.home(),
                KeyCode::End => overlay.end(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, overlay: &CopyOverlay) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Heading
            Constraint::Min(0),    // CSV text
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_heading(f, chunks[0]);
    render_text(f, chunks[1], overlay);
    render_status_bar(f, chunks[2], overlay);
}

fn render_heading(f: &mut Frame, area: Rect) {
    let heading = Paragraph::new(Line::from(Span::styled(
        COPY_HEADING,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(heading, area);
}

fn render_text(f: &mut Frame, area: Rect, overlay: &CopyOverlay) {
    let lines: Vec<Line> = overlay.lines.iter().map(|l| Line::raw(l.as_str())).collect();
    let scroll = u16::try_from(overlay.scroll).unwrap_or(u16::MAX);

    let text = Paragraph::new(lines)
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" transactions.csv "),
        );

    f.render_widget(text, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, overlay: &CopyOverlay) {
    let status_spans = vec![
        Span::styled(
            format!(" Line: {}/{} ", overlay.scroll + 1, overlay.lines.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Scroll | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Close"),
    ];

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn sample() -> String {
        let mut text = String::from("Description,Account,Date,Category,Amount\n");
        for i in 0..30 {
            text.push_str(&format!("Item {},Sofi,5/{}/2025,,-1.00\n", i, i + 1));
        }
        text
    }

    #[test]
    fn test_overlay_scroll_bounds() {
        let mut overlay = CopyOverlay::new(&sample());
        assert_eq!(overlay.lines.len(), 31);

        overlay.scroll_up();
        assert_eq!(overlay.scroll, 0);

        overlay.page_down();
        assert_eq!(overlay.scroll, 20);
        overlay.page_down();
        assert_eq!(overlay.scroll, 30);
        overlay.scroll_down();
        assert_eq!(overlay.scroll, 30);

        overlay.home();
        assert_eq!(overlay.scroll, 0);
        overlay.end();
        assert_eq!(overlay.scroll, 30);
        overlay.page_up();
        assert_eq!(overlay.scroll, 10);
    }

    #[test]
    fn test_overlay_empty_text() {
        let mut overlay = CopyOverlay::new("");
        overlay.page_down();
        overlay.scroll_down();
        assert_eq!(overlay.scroll, 0);
    }

    #[test]
    fn test_overlay_renders_heading_and_rows() {
        let overlay = CopyOverlay::new(&sample());
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();

        terminal.draw(|f| ui(f, &overlay)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("Copy the CSV data below:"));
        assert!(screen.contains("Description,Account,Date,Category,Amount"));
    }
}
