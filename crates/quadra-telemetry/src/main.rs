//! quadra-telemetry: TUI diagnostics for games built on quadra.
//!
//! Listens for the JSON snapshots quadra's `diagnostics` feature sends over
//! UDP and shows them as a live terminal dashboard using ratatui: frame rate,
//! draw calls and orphans over time, the sprite pipeline counters, and the
//! captured log tail.
//!
//! Run a quadra game (diagnostics are on by default), then
//! `cargo run -p quadra-telemetry`.

use std::collections::VecDeque;
use std::io;
use std::net::UdpSocket;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Sparkline};
use serde::Deserialize;

const LISTEN_ADDR: &str = "127.0.0.1:9100";

// ── Wire types (must match quadra's JSON format) ────────────────────────

#[derive(Deserialize, Clone, Default)]
#[serde(default)]
struct DiagSnapshot {
    fps: f32,
    delta_ms: f32,
    frame_count: u64,
    elapsed_secs: f32,
    frame: PipelineStats,
    window: WindowInfo,
    budget: BudgetInfo,
    textures_loaded: usize,
    logs: Vec<LogEntryInfo>,
}

#[derive(Deserialize, Clone, Copy, Default)]
#[serde(default)]
struct PipelineStats {
    sprites: u64,
    quads_buffered: u64,
    draw_calls: u64,
    state_changes: u64,
    orphans: u64,
    partial_buffers: u64,
    map_failures: u64,
    vertex_bytes: u64,
    index_bytes: u64,
}

#[derive(Deserialize, Clone, Copy, Default)]
#[serde(default)]
struct WindowInfo {
    frames: u32,
    totals: PipelineStats,
}

impl WindowInfo {
    /// Average of a window total over the frames it covers.
    fn per_frame(&self, total: u64) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            total as f64 / f64::from(self.frames)
        }
    }
}

#[derive(Deserialize, Clone, Copy, Default)]
#[serde(default)]
struct BudgetInfo {
    update_ms: f32,
    draw_ms: f32,
}

#[derive(Deserialize, Clone, Default)]
#[serde(default)]
struct LogEntryInfo {
    level: String,
    target: String,
    message: String,
    timestamp_secs: f32,
}

// ── Tabs ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tab {
    Overview,
    Pipeline,
    Logs,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Overview, Tab::Pipeline, Tab::Logs];

    fn next(self) -> Self {
        match self {
            Tab::Overview => Tab::Pipeline,
            Tab::Pipeline => Tab::Logs,
            Tab::Logs => Tab::Overview,
        }
    }

    fn prev(self) -> Self {
        match self {
            Tab::Overview => Tab::Logs,
            Tab::Pipeline => Tab::Overview,
            Tab::Logs => Tab::Pipeline,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Pipeline => "Pipeline",
            Tab::Logs => "Logs",
        }
    }
}

// ── Log level filter ────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LogFilter {
    Info,
    Warn,
    Error,
}

impl LogFilter {
    fn next(self) -> Self {
        match self {
            LogFilter::Info => LogFilter::Warn,
            LogFilter::Warn => LogFilter::Error,
            LogFilter::Error => LogFilter::Info,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogFilter::Info => "INFO+",
            LogFilter::Warn => "WARN+",
            LogFilter::Error => "ERROR",
        }
    }

    fn passes(self, level: &str) -> bool {
        match self {
            LogFilter::Info => matches!(level, "INFO" | "WARN" | "ERROR"),
            LogFilter::Warn => matches!(level, "WARN" | "ERROR"),
            LogFilter::Error => level == "ERROR",
        }
    }
}

// ── App state ────────────────────────────────────────────────────────────

const HISTORY_CAP: usize = 1200;
const LOG_CAP: usize = 2000;

/// Ring of samples for one sparkline.
struct History {
    samples: VecDeque<u64>,
}

impl History {
    fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAP),
        }
    }

    fn push(&mut self, value: u64) {
        if self.samples.len() >= HISTORY_CAP {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    fn to_vec(&self) -> Vec<u64> {
        self.samples.iter().copied().collect()
    }
}

struct App {
    latest: DiagSnapshot,
    fps: History,
    /// Microseconds, so the sparkline keeps sub-millisecond detail.
    delta_us: History,
    draw_calls: History,
    orphans: History,
    active_tab: Tab,
    paused: bool,
    connected: bool,
    log_entries: Vec<LogEntryInfo>,
    log_filter: LogFilter,
    log_auto_scroll: bool,
    log_scroll_offset: usize,
}

impl App {
    fn new() -> Self {
        Self {
            latest: DiagSnapshot::default(),
            fps: History::new(),
            delta_us: History::new(),
            draw_calls: History::new(),
            orphans: History::new(),
            active_tab: Tab::Overview,
            paused: false,
            connected: false,
            log_entries: Vec::new(),
            log_filter: LogFilter::Info,
            log_auto_scroll: true,
            log_scroll_offset: 0,
        }
    }

    fn push_snapshot(&mut self, snap: DiagSnapshot) {
        if self.paused {
            return;
        }

        self.fps.push(snap.fps.round().max(0.0) as u64);
        self.delta_us.push((snap.delta_ms * 1000.0).round().max(0.0) as u64);
        self.draw_calls
            .push(snap.window.per_frame(snap.window.totals.draw_calls).round() as u64);
        self.orphans.push(snap.window.totals.orphans);

        self.log_entries.extend(snap.logs.iter().cloned());
        if self.log_entries.len() > LOG_CAP {
            let excess = self.log_entries.len() - LOG_CAP;
            self.log_entries.drain(..excess);
        }

        self.latest = snap;
        self.connected = true;
    }

    fn log_counts(&self) -> (usize, usize, usize) {
        let (mut i, mut w, mut e) = (0, 0, 0);
        for log in &self.log_entries {
            match log.level.as_str() {
                "INFO" => i += 1,
                "WARN" => w += 1,
                "ERROR" => e += 1,
                _ => {}
            }
        }
        (i, w, e)
    }

    fn filtered_logs(&self) -> Vec<&LogEntryInfo> {
        self.log_entries
            .iter()
            .filter(|e| self.log_filter.passes(&e.level))
            .collect()
    }
}

// ── Main ─────────────────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    let socket = UdpSocket::bind(LISTEN_ADDR).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("cannot bind {LISTEN_ADDR} (is another quadra-telemetry running?): {e}"),
        )
    })?;
    socket.set_nonblocking(true)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let result = run(&mut terminal, &socket, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    socket: &UdpSocket,
    app: &mut App,
) -> io::Result<()> {
    let mut buf = [0u8; 65536];
    loop {
        // Drain all pending datagrams.
        while let Ok(n) = socket.recv(&mut buf) {
            if let Ok(snap) = serde_json::from_slice::<DiagSnapshot>(&buf[..n]) {
                app.push_snapshot(snap);
            }
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && handle_key(app, key)
        {
            return Ok(());
        }
    }
}

// ── Key handling ─────────────────────────────────────────────────────────

/// Returns `true` if the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('p') => app.paused = !app.paused,

        KeyCode::Char('1') => app.active_tab = Tab::Overview,
        KeyCode::Char('2') => app.active_tab = Tab::Pipeline,
        KeyCode::Char('3') => app.active_tab = Tab::Logs,
        KeyCode::Tab => app.active_tab = app.active_tab.next(),
        KeyCode::BackTab => app.active_tab = app.active_tab.prev(),

        KeyCode::Char('l') if app.active_tab == Tab::Logs => app.log_filter = app.log_filter.next(),
        KeyCode::Char('g') if app.active_tab == Tab::Logs => {
            app.log_auto_scroll = !app.log_auto_scroll;
            if !app.log_auto_scroll {
                app.log_scroll_offset = app.filtered_logs().len().saturating_sub(1);
            }
        }
        KeyCode::Up if app.active_tab == Tab::Logs => {
            app.log_auto_scroll = false;
            app.log_scroll_offset = app.log_scroll_offset.saturating_sub(1);
        }
        KeyCode::Down if app.active_tab == Tab::Logs => {
            let total = app.filtered_logs().len();
            if app.log_scroll_offset + 1 < total {
                app.log_scroll_offset += 1;
            }
        }
        _ => {}
    }
    false
}

// ── Drawing ──────────────────────────────────────────────────────────────

fn ui(f: &mut ratatui::Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tab bar
            Constraint::Min(6),    // tab content
            Constraint::Length(3), // frame budget
            Constraint::Length(1), // help bar
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_tab_bar(f, app, chunks[1]);
    match app.active_tab {
        Tab::Overview => draw_overview_tab(f, app, chunks[2]),
        Tab::Pipeline => draw_pipeline_tab(f, app, chunks[2]),
        Tab::Logs => draw_logs_tab(f, app, chunks[2]),
    }
    draw_frame_budget(f, app, chunks[3]);
    draw_help_bar(f, app, chunks[4]);
}

fn draw_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let s = &app.latest;
    let (status, status_color) = if app.paused {
        (" PAUSED ", Color::Yellow)
    } else if app.connected {
        (" LIVE ", Color::Green)
    } else {
        (" WAITING ", Color::DarkGray)
    };
    let label = |t: &'static str| Span::styled(t, Style::default().fg(Color::DarkGray));
    let value = |v: String| Span::styled(v, Style::default().fg(Color::White));

    let text = Line::from(vec![
        Span::styled(status, Style::default().bg(status_color).fg(Color::Black)),
        Span::raw("  "),
        label("FPS: "),
        Span::styled(
            format!("{:.1}", s.fps),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        label("Frame: "),
        value(s.frame_count.to_string()),
        Span::raw("  |  "),
        label("\u{0394}: "),
        value(format!("{:.1}ms", s.delta_ms)),
        Span::raw("  |  "),
        label("Sprites: "),
        value(s.frame.sprites.to_string()),
        Span::raw("  |  "),
        label("Textures: "),
        value(s.textures_loaded.to_string()),
        Span::raw("  |  "),
        label("Up: "),
        value(format_uptime(s.elapsed_secs)),
    ]);

    let block = Block::default()
        .title(" quadra-telemetry ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_tab_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        let num = format!(" {} ", i + 1);
        let label = format!("{} ", tab.label());
        if *tab == app.active_tab {
            spans.push(Span::styled(
                num,
                Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(label, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)));
        } else {
            spans.push(Span::styled(num, Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(label, Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::raw("  "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Overview Tab ─────────────────────────────────────────────────────────

fn draw_overview_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let fps = app.fps.to_vec();
    let (lo, avg, hi) = stats(&fps);
    draw_sparkline(
        f,
        top[0],
        " FPS History ",
        &fps,
        Color::Green,
        format!("min: {lo:.0}  avg: {avg:.0}  max: {hi:.0}"),
    );

    let delta = app.delta_us.to_vec();
    let (lo, avg, hi) = stats(&delta);
    draw_sparkline(
        f,
        top[1],
        " Delta Time ",
        &delta,
        Color::Yellow,
        format!(
            "min: {:.1}ms  avg: {:.1}ms  max: {:.1}ms",
            lo / 1000.0,
            avg / 1000.0,
            hi / 1000.0
        ),
    );

    let draws = app.draw_calls.to_vec();
    let (lo, avg, hi) = stats(&draws);
    draw_sparkline(
        f,
        bottom[0],
        " Draw Calls / Frame ",
        &draws,
        Color::Cyan,
        format!("min: {lo:.0}  avg: {avg:.1}  max: {hi:.0}"),
    );

    let orphans = app.orphans.to_vec();
    let total: u64 = orphans.iter().sum();
    draw_sparkline(
        f,
        bottom[1],
        " Orphans / 100ms ",
        &orphans,
        Color::Magenta,
        format!("total in history: {total}"),
    );
}

fn draw_sparkline(f: &mut ratatui::Frame, area: Rect, title: &str, data: &[u64], color: Color, caption: String) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let spark_area = Rect {
        height: inner.height - 1,
        ..inner
    };
    let caption_area = Rect {
        y: inner.y + inner.height - 1,
        height: 1,
        ..inner
    };
    // Newest samples on the right.
    let visible = data.len().saturating_sub(spark_area.width as usize);
    f.render_widget(
        Sparkline::default().data(&data[visible..]).style(Style::default().fg(color)),
        spark_area,
    );
    f.render_widget(
        Paragraph::new(Span::styled(caption, Style::default().fg(Color::DarkGray))),
        caption_area,
    );
}

// ── Pipeline Tab ─────────────────────────────────────────────────────────

fn draw_pipeline_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Sprite Pipeline (last frame | avg over {} frames) ", app.latest.window.frames))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let frame = &app.latest.frame;
    let window = &app.latest.window;
    let t = &window.totals;
    let rows: [(&str, u64, u64); 9] = [
        ("sprites", frame.sprites, t.sprites),
        ("quads buffered", frame.quads_buffered, t.quads_buffered),
        ("draw calls", frame.draw_calls, t.draw_calls),
        ("state changes", frame.state_changes, t.state_changes),
        ("orphans", frame.orphans, t.orphans),
        ("partial buffers", frame.partial_buffers, t.partial_buffers),
        ("map failures", frame.map_failures, t.map_failures),
        ("vertex bytes", frame.vertex_bytes, t.vertex_bytes),
        ("index bytes", frame.index_bytes, t.index_bytes),
    ];

    let mut lines: Vec<Line> = rows
        .iter()
        .map(|&(name, last, total)| {
            let warn = name == "map failures" && total > 0;
            let color = if warn { Color::Red } else { Color::White };
            Line::from(vec![
                Span::styled(format!("  {name:<16}"), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{last:>12}"), Style::default().fg(color)),
                Span::styled(
                    format!("{:>14.1}", window.per_frame(total)),
                    Style::default().fg(Color::Gray),
                ),
            ])
        })
        .collect();

    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("  sprites / draw  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:>12.1}", ratio(frame.sprites, frame.draw_calls)),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  upload / frame  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format_bytes(frame.vertex_bytes + frame.index_bytes),
            Style::default().fg(Color::White),
        ),
    ]));

    f.render_widget(Paragraph::new(lines), inner);
}

// ── Logs Tab ─────────────────────────────────────────────────────────────

fn draw_logs_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let (i, w, e) = app.log_counts();
    let scroll_label = if app.log_auto_scroll { "auto" } else { "manual" };

    let block = Block::default()
        .title(format!(
            " Logs [{}]  I:{i} W:{w} E:{e}  scroll:{scroll_label} ",
            app.log_filter.label()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let filtered = app.filtered_logs();
    if filtered.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("  No log messages", Style::default().fg(Color::DarkGray))),
            inner,
        );
        return;
    }

    let visible = inner.height as usize;
    let total = filtered.len();
    let offset = if app.log_auto_scroll {
        total.saturating_sub(visible)
    } else {
        app.log_scroll_offset.min(total.saturating_sub(visible))
    };

    let lines: Vec<Line> = filtered
        .iter()
        .skip(offset)
        .take(visible)
        .map(|entry| {
            let level_color = match entry.level.as_str() {
                "INFO" => Color::Cyan,
                "WARN" => Color::Yellow,
                "ERROR" => Color::Red,
                _ => Color::White,
            };
            Line::from(vec![
                Span::styled(
                    format!("  [{:>6.1}s] ", entry.timestamp_secs),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<5} ", entry.level),
                    Style::default().fg(level_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{} ", entry.target), Style::default().fg(Color::DarkGray)),
                Span::styled(entry.message.clone(), Style::default().fg(Color::White)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

// ── Frame budget + help bar ──────────────────────────────────────────────

fn draw_frame_budget(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Frame Budget (16.6ms target) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !app.connected {
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("  Waiting for a game on {LISTEN_ADDR}..."),
                Style::default().fg(Color::DarkGray),
            )),
            inner,
        );
        return;
    }

    let b = app.latest.budget;
    let total_ms = f64::from(b.update_ms + b.draw_ms);
    let pct = total_ms / 16.6;
    let bar_color = if pct < 0.8 {
        Color::Green
    } else if pct <= 1.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    let bar_width = inner.width.saturating_sub(40) as usize;
    let filled = ((pct.min(1.5) / 1.5) * bar_width as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(bar_width.saturating_sub(filled))
    );

    let text = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{total_ms:.1}ms"),
            Style::default().fg(bar_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" (update: {:.1}ms | draw: {:.1}ms) ", b.update_ms, b.draw_ms),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(bar, Style::default().fg(bar_color)),
    ]);
    f.render_widget(Paragraph::new(text), inner);
}

fn draw_help_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
    let mut spans = vec![
        key(" [1-3]"),
        Span::raw(" tab  "),
        key("[Tab]"),
        Span::raw(" next  "),
    ];
    if app.active_tab == Tab::Logs {
        spans.extend([
            key("[l]"),
            Span::raw(" filter  "),
            key("[g]"),
            Span::raw(" auto-scroll  "),
            key("[\u{2191}\u{2193}]"),
            Span::raw(" scroll  "),
        ]);
    }
    spans.extend([key("[p]"), Span::raw(" pause  "), key("[q]"), Span::raw(" quit")]);
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn stats(data: &[u64]) -> (f64, f64, f64) {
    let (Some(min), Some(max)) = (data.iter().min(), data.iter().max()) else {
        return (0.0, 0.0, 0.0);
    };
    let avg = data.iter().sum::<u64>() as f64 / data.len() as f64;
    (*min as f64, avg, *max as f64)
}

fn ratio(a: u64, b: u64) -> f64 {
    if b == 0 { 0.0 } else { a as f64 / b as f64 }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB {
        format!("{:>10.2} MiB", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:>10.1} KiB", b / KIB)
    } else {
        format!("{bytes:>10} B")
    }
}

fn format_uptime(secs: f32) -> String {
    let total = secs as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{secs:.1}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "fps": 59.6, "delta_ms": 16.8, "frame_count": 600, "elapsed_secs": 10.0,
        "frame": {"sprites": 10012, "quads_buffered": 10012, "draw_calls": 5,
                  "state_changes": 2, "orphans": 2, "partial_buffers": 2,
                  "map_failures": 0, "vertex_bytes": 800960, "index_bytes": 120144},
        "window": {"frames": 6, "totals": {"draw_calls": 30, "orphans": 12}},
        "budget": {"update_ms": 2.5, "draw_ms": 4.0},
        "textures_loaded": 2,
        "logs": [{"level": "WARN", "target": "quadra::sprite", "message": "map failed", "timestamp_secs": 9.5}]
    }"#;

    #[test]
    fn parses_snapshot() {
        let snap: DiagSnapshot = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(snap.frame.sprites, 10012);
        assert_eq!(snap.window.totals.orphans, 12);
        // Missing counters default to zero.
        assert_eq!(snap.window.totals.sprites, 0);
        assert_eq!(snap.logs.len(), 1);
    }

    #[test]
    fn parses_snapshot_without_logs() {
        let snap: DiagSnapshot = serde_json::from_str(r#"{"fps": 60.0}"#).unwrap();
        assert!(snap.logs.is_empty());
        assert_eq!(snap.window.per_frame(10), 0.0);
    }

    #[test]
    fn push_snapshot_records_history() {
        let mut app = App::new();
        app.push_snapshot(serde_json::from_str(SAMPLE).unwrap());
        assert!(app.connected);
        assert_eq!(app.fps.to_vec(), vec![60]);
        assert_eq!(app.delta_us.to_vec(), vec![16800]);
        assert_eq!(app.draw_calls.to_vec(), vec![5]);
        assert_eq!(app.orphans.to_vec(), vec![12]);
        assert_eq!(app.log_counts(), (0, 1, 0));
    }

    #[test]
    fn paused_drops_snapshots() {
        let mut app = App::new();
        app.paused = true;
        app.push_snapshot(serde_json::from_str(SAMPLE).unwrap());
        assert!(!app.connected);
        assert!(app.fps.to_vec().is_empty());
    }

    #[test]
    fn history_is_capped() {
        let mut h = History::new();
        for i in 0..(HISTORY_CAP as u64 + 5) {
            h.push(i);
        }
        let v = h.to_vec();
        assert_eq!(v.len(), HISTORY_CAP);
        assert_eq!(v[0], 5);
    }

    #[test]
    fn log_filter_levels() {
        assert!(LogFilter::Info.passes("INFO"));
        assert!(!LogFilter::Warn.passes("INFO"));
        assert!(LogFilter::Warn.passes("ERROR"));
        assert!(!LogFilter::Error.passes("WARN"));
        assert_eq!(LogFilter::Error.next(), LogFilter::Info);
    }

    #[test]
    fn helpers() {
        assert_eq!(stats(&[]), (0.0, 0.0, 0.0));
        assert_eq!(stats(&[2, 4, 6]), (2.0, 4.0, 6.0));
        assert_eq!(ratio(10, 0), 0.0);
        assert_eq!(format_uptime(75.0), "1m15s");
        assert_eq!(format_uptime(3725.0), "1h2m5s");
        assert_eq!(format_bytes(512).trim(), "512 B");
        assert_eq!(format_bytes(2048).trim(), "2.0 KiB");
    }

    #[test]
    fn tab_cycle() {
        assert_eq!(Tab::Logs.next(), Tab::Overview);
        assert_eq!(Tab::Overview.prev(), Tab::Logs);
    }
}
