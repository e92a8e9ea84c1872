pub mod charting;

use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, Gauge, GraphType, Paragraph, Widget},
};
use typerush::{
    metrics::{outcomes, Outcome},
    session::SessionState,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const VISIBLE_LINES: usize = 3;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.controller.snapshot();
        if snapshot.state == SessionState::Finished {
            render_results(self, area, buf);
        } else {
            render_typing(self, area, buf);
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let snapshot = app.controller.snapshot();

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let prompt_lines = VISIBLE_LINES as u16;
    let filler = area.height.saturating_sub(prompt_lines + 4) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(filler),
            Constraint::Length(2), // timer + live stats
            Constraint::Length(prompt_lines),
            Constraint::Length(1), // padding
            Constraint::Length(1), // progress
            Constraint::Min(0),
        ])
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{}", snapshot.remaining_seconds),
            bold_style,
        )),
        Line::from(Span::styled(
            format!(
                "{} wpm   {} cpm   {}% acc",
                snapshot.wpm, snapshot.cpm, snapshot.accuracy
            ),
            dim_bold_style,
        )),
    ])
    .alignment(Alignment::Center);
    header.render(chunks[1], buf);

    let target: Vec<char> = snapshot.target_text.chars().collect();
    let typed: Vec<char> = snapshot.typed_input.chars().collect();
    let marks: Vec<Outcome> = outcomes(&snapshot.target_text, &snapshot.typed_input).collect();
    let cursor = typed.len();

    let width = chunks[2].width.max(1) as usize;
    let lines = wrap_lines(&target, width);
    let first = cursor_line(&lines, cursor).saturating_sub(1);

    let rendered: Vec<Line> = lines
        .iter()
        .skip(first)
        .take(VISIBLE_LINES)
        .map(|range| {
            let spans = range
                .clone()
                .map(|idx| match marks.get(idx) {
                    Some(Outcome::Correct) => {
                        Span::styled(target[idx].to_string(), green_bold_style)
                    }
                    Some(Outcome::Incorrect) => Span::styled(
                        match typed[idx] {
                            ' ' => "·".to_owned(),
                            c => c.to_string(),
                        },
                        red_bold_style,
                    ),
                    None if idx == cursor => {
                        Span::styled(target[idx].to_string(), underlined_dim_bold_style)
                    }
                    None => Span::styled(target[idx].to_string(), dim_bold_style),
                })
                .collect::<Vec<Span>>();
            Line::from(spans)
        })
        .collect();

    Paragraph::new(rendered).render(chunks[2], buf);

    if snapshot.state == SessionState::Idle {
        Paragraph::new(Span::styled(
            "start typing, the clock starts on your first key",
            italic_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    } else {
        let percent = app.progress.map(|p| p.percent).unwrap_or(0).min(100);
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta))
            .percent(percent as u16)
            .render(chunks[4], buf);
    }

    let legend = Paragraph::new(Span::styled(
        format!(
            "{} / {}s   (tab) restart / (esc)ape",
            app.controller.profile().id(),
            app.controller.session().total_duration_secs()
        ),
        italic_style,
    ))
    .alignment(Alignment::Center);
    if let Some(last) = chunks.last() {
        if last.height > 0 {
            let bottom = Rect {
                y: last.y + last.height - 1,
                height: 1,
                ..*last
            };
            legend.render(bottom, buf);
        }
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let snapshot = app.controller.snapshot();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // personal best
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let samples = app.controller.wpm_samples();
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(samples, app.controller.session().total_duration_secs());

    let tuples: Vec<(f64, f64)> = samples.iter().map(|&s| s.into()).collect();
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        );
    chart.render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {} cpm   {}% acc   {} / {}s",
            snapshot.wpm,
            snapshot.cpm,
            snapshot.accuracy,
            app.controller.profile().id(),
            app.controller.session().total_duration_secs()
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let best_line = match &app.history {
        Some(h) => format!(
            "personal best {} wpm ({}% acc)   avg {:.0} ± {:.1} over {} runs",
            h.best_wpm, h.best_accuracy, h.mean_wpm, h.wpm_std_dev, h.runs
        ),
        None => "no saved results yet".to_string(),
    };
    Paragraph::new(Span::styled(
        best_line,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled("(r)etry / (esc)ape", italic_style)).render(chunks[4], buf);
}

/// Greedy word wrap over char indices. Each range keeps its trailing space
/// so the ranges tile the whole text.
fn wrap_lines(chars: &[char], width: usize) -> Vec<Range<usize>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let hard_end = (start + width).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            match chars[start..hard_end].iter().rposition(|c| *c == ' ') {
                Some(pos) => start + pos + 1,
                None => hard_end,
            }
        };
        lines.push(start..end);
        start = end;
    }
    lines
}

/// Index of the line holding char `cursor`; past the end maps to the last line.
fn cursor_line(lines: &[Range<usize>], cursor: usize) -> usize {
    lines
        .iter()
        .position(|r| r.contains(&cursor))
        .unwrap_or(lines.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_wrap_breaks_at_spaces() {
        let text = chars("the quick brown fox");
        let lines = wrap_lines(&text, 10);
        assert_eq!(lines, vec![0..10, 10..19]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let text = chars("abcdefghij");
        assert_eq!(wrap_lines(&text, 4), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn test_wrap_tiles_text() {
        let text = chars("one two three four five six seven");
        let lines = wrap_lines(&text, 7);
        assert_eq!(lines.first().map(|r| r.start), Some(0));
        assert_eq!(lines.last().map(|r| r.end), Some(text.len()));
        assert!(lines.windows(2).all(|w| w[0].end == w[1].start));
        assert!(lines.iter().all(|r| r.len() <= 7));
    }

    #[test]
    fn test_cursor_line() {
        let lines = vec![0..4, 4..10, 10..19];
        assert_eq!(cursor_line(&lines, 0), 0);
        assert_eq!(cursor_line(&lines, 4), 1);
        assert_eq!(cursor_line(&lines, 19), 2);
    }
}
