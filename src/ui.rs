use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use turing_cv::clock::{MAX_TEMPO, MIN_TEMPO};
use turing_cv::mode::map_range;
use turing_cv::{ClockMode, Mode, Snapshot, MAX_STEPS};

use crate::app::App;

pub type Rgb = (u8, u8, u8);

const OFF: Rgb = (0, 0, 0);

// ── LED colors ────────────────────────────────────────────────────────────────

/// Classic 0–255 color wheel: red → green → blue → red.
pub fn wheel(pos: u8) -> Rgb {
    match pos {
        0..=84    => (255 - pos * 3, pos * 3, 0),
        85..=169  => { let p = pos - 85;  (0, 255 - p * 3, p * 3) }
        _         => { let p = pos - 170; (p * 3, 0, 255 - p * 3) }
    }
}

pub fn root_color(root: u8) -> Rgb {
    wheel(30 + root.min(11) * 20)
}

/// Colors for the 8-pixel strip.
///
/// Performance: cursor pixel is white (pink while re-rolling), notes that land
/// on the root octave show the root color, others a green level by pitch,
/// unused slots are dark. The last pixel shows the root color while held.
/// Setup: the whole strip takes a hue from the tempo.
pub fn led_colors(snap: &Snapshot) -> [Rgb; MAX_STEPS] {
    let mut px = [OFF; MAX_STEPS];
    match snap.mode {
        Mode::Performance => {
            let root = root_color(snap.root);
            for (i, p) in px.iter_mut().enumerate() {
                *p = if i == snap.cursor {
                    let r = if snap.randomizing { 200 } else { 0 };
                    (255, 255 - r, 255 - r)
                } else if i < snap.length {
                    let note = snap.notes[i];
                    if note % 12 == 0 { root } else { (0, 1 + 40 * (note % 6), 0) }
                } else {
                    OFF
                };
            }
            if snap.held { px[MAX_STEPS - 1] = root; }
        }
        Mode::Setup => {
            let hue = map_range(snap.tempo, MIN_TEMPO, MAX_TEMPO, 0.0, 230.0) as u8;
            px = [wheel(hue); MAX_STEPS];
        }
    }
    px
}

pub fn note_name(note: u8) -> &'static str {
    ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"][(note % 12) as usize]
}

// ── Top-level layout ──────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, app: &App, enhanced: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // title
            Constraint::Length(5),  // LED strip
            Constraint::Length(6),  // knobs + button
            Constraint::Length(6),  // sequence
            Constraint::Length(5),  // output
            Constraint::Min(0),     // help
        ])
        .split(f.area());

    draw_title(f, chunks[0], enhanced, app);
    draw_leds(f, chunks[1], &app.snapshot);
    draw_controls(f, chunks[2], app);
    draw_sequence(f, chunks[3], &app.snapshot);
    draw_output(f, chunks[4], app);
    draw_help(f, chunks[5]);
}

fn draw_title(f: &mut Frame, area: Rect, enhanced: bool, app: &App) {
    let snap = &app.snapshot;
    let kb_mode = if enhanced { "enhanced" } else { "fallback" };
    let audio = if app.audio_enabled() { "audio on" } else { "audio off" };
    let text = format!(
        "  Turing CV  ─  {}  ─  clock {}  ─  [{}]  [{}]",
        snap.mode.name(), snap.clock_mode.name(), kb_mode, audio
    );
    let color = match snap.mode { Mode::Performance => Color::Cyan, Mode::Setup => Color::Yellow };
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_leds(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let px = led_colors(snap);
    let cells: Vec<Span> = px.iter()
        .map(|&(r, g, b)| Span::styled(" ████ ", Style::default().fg(Color::Rgb(r, g, b))))
        .collect();
    let labels: Vec<Span> = (0..MAX_STEPS)
        .map(|i| Span::styled(format!("{:^6}", i + 1), Style::default().fg(Color::DarkGray)))
        .collect();

    f.render_widget(
        Paragraph::new(vec![Line::from(cells.clone()), Line::from(cells), Line::from(labels)])
            .block(Block::default().title(" LEDs ").borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))),
        area,
    );
}

fn pbar(v: u8) -> String {
    let filled = (v as usize * 16 + 127) / 255;
    format!("{}{}", "█".repeat(filled), "░".repeat(16 - filled))
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let snap = &app.snapshot;
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let knob0_role = match snap.mode {
        Mode::Performance if snap.held => "root",
        Mode::Performance => if snap.randomizing { "random ▶ ON" } else { "random" },
        Mode::Setup if app.knob0 == u8::MAX => "tempo ▶ EXT",
        Mode::Setup => "tempo",
    };
    let knob1_role = match snap.mode {
        Mode::Performance => "length",
        Mode::Setup       => "—",
    };
    let (btn, btn_style) = match (app.button_down, snap.held) {
        (_, true)  => ("HELD",     Style::default().fg(Color::Black).bg(Color::Magenta)),
        (true, _)  => ("DOWN",     Style::default().fg(Color::Black).bg(Color::Yellow)),
        _          => ("up",       label),
    };
    let clk = if app.clock_level { ("▲ HIGH", Color::Green) } else { ("▽ low", Color::DarkGray) };

    let lines = vec![
        Line::from(vec![
            Span::styled("Knob0 ", label), Span::styled(pbar(app.knob0), value),
            Span::styled(format!(" {:3}  ", app.knob0), value),
            Span::styled(knob0_role, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Knob1 ", label), Span::styled(pbar(app.knob1), value),
            Span::styled(format!(" {:3}  ", app.knob1), value),
            Span::styled(knob1_role, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Button ", label), Span::styled(format!(" {} ", btn), btn_style),
            Span::raw("   "),
            Span::styled("Clock in ", label), Span::styled(clk.0, Style::default().fg(clk.1)),
        ]),
        Line::from(Span::styled(&app.status_msg, Style::default().fg(Color::Yellow))),
    ];

    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(" Panel ").borders(Borders::ALL)),
        area,
    );
}

fn draw_sequence(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let label = Style::default().fg(Color::DarkGray);
    let bold  = |c: Color| Style::default().fg(c).add_modifier(Modifier::BOLD);
    let tempo = match snap.clock_mode {
        ClockMode::Internal => format!("{:.0} bpm", snap.tempo),
        ClockMode::External => "external".to_string(),
    };

    let header = Line::from(vec![
        Span::styled("Scale: ", label), Span::styled(snap.scale.name(), bold(Color::Cyan)),
        Span::raw("  "),
        Span::styled("Root: ", label), Span::styled(note_name(snap.root), bold(Color::Magenta)),
        Span::raw("  "),
        Span::styled("Length: ", label), Span::styled(format!("{}", snap.length), bold(Color::Cyan)),
        Span::raw("  "),
        Span::styled("Tempo: ", label), Span::styled(tempo, bold(Color::Green)),
    ]);

    let mut nums = Vec::new();
    let mut cells = Vec::new();
    for i in 0..MAX_STEPS {
        let is_cur = i == snap.cursor;
        let active = i < snap.length;
        let sty = if is_cur && snap.randomizing { Style::default().fg(Color::Black).bg(Color::LightRed).add_modifier(Modifier::BOLD) }
                  else if is_cur                { Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD) }
                  else if active                { Style::default().fg(Color::White) }
                  else                          { Style::default().fg(Color::DarkGray) };
        nums.push(Span::styled(format!("{:^6}", i + 1), if is_cur { sty } else { label }));
        let cell = match snap.notes.get(i) {
            Some(&n) => format!("[{:>3}]", format!("+{}", n)),
            None     => "[ · ]".to_string(),
        };
        cells.push(Span::styled(format!("{} ", cell), sty));
    }

    f.render_widget(
        Paragraph::new(vec![header, Line::from(nums), Line::from(cells)])
            .block(Block::default().title(" Sequence ").borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))),
        area,
    );
}

fn draw_output(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::DarkGray);
    let last = match app.last_step {
        Some(ev) => format!("step {}  note {}{}  cv {:5}  ({:.3} V)",
            ev.step + 1, note_name(ev.note), ev.note / 12,
            ev.cv, turing_cv::NoteEncoder::code_to_volts(ev.cv)),
        None => "—".to_string(),
    };
    let hist: Vec<String> = app.history.iter()
        .map(|ev| format!("{}{}", note_name(ev.note), ev.note / 12))
        .collect();

    let text = vec![
        Line::from(vec![
            Span::styled("Last: ", label),
            Span::styled(last, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("History: ", label),
            Span::styled(hist.join(" "), Style::default().fg(Color::White)),
        ]),
    ];

    f.render_widget(
        Paragraph::new(text)
            .block(Block::default().title(" CV out ").borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    let w = Style::default().fg(Color::White);

    let knobs = Line::from(vec![
        Span::styled("[←→] ", w),    Span::raw("Knob0  │  "),
        Span::styled("[↑↓] ", w),    Span::raw("Knob1  │  "),
        Span::styled("[Home/End] ", w), Span::raw("Knob0 min/max  │  "),
        Span::styled("[PgUp/Dn] ", w),  Span::raw("Knob1 max/min"),
    ]);
    let actions = Line::from(vec![
        Span::styled("[Space] ", w), Span::raw("Button (tap: mode, hold: root)  │  "),
        Span::styled("[c] ", w),     Span::raw("Clock pulse  │  "),
        Span::styled("[Esc] ", w),   Span::raw("Quit"),
    ]);

    f.render_widget(
        Paragraph::new(vec![knobs, actions])
            .block(Block::default().title(" Help ").borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
