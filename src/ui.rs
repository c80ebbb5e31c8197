use glam::{DMat4, DVec3};
use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Points},
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};

use crate::app::{App, Focus, InputMode};
use crate::camera::OrbitCamera;
use crate::chat::{Author, TextGenerator, SUGGESTED_QUESTIONS};
use crate::scene::MoleculeVariant;

const INPUT_PLACEHOLDER: &str = "Ask me anything about biology...";

pub fn render<G: TextGenerator>(app: &mut App<G>, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    let [chat_area, viewer_area] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
            .areas(body_area);

    render_chat_panel(app, frame, chat_area);
    render_viewer_panel(app, frame, viewer_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " CellMate AI Biology Tutor ",
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat_panel<G: TextGenerator>(app: &mut App<G>, frame: &mut Frame, area: Rect) {
    let suggestions_height = if app.show_suggestions() {
        SUGGESTED_QUESTIONS.len() as u16 + 2
    } else {
        0
    };

    let [messages_area, suggestions_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(suggestions_height),
        Constraint::Length(3),
    ])
    .areas(area);

    render_messages(app, frame, messages_area);
    if suggestions_height > 0 {
        render_suggestions(app, frame, suggestions_area);
    } else {
        app.suggestion_areas.clear();
    }
    render_input(app, frame, input_area);
}

fn render_messages<G: TextGenerator>(app: &mut App<G>, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Chat;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Conversation ")
        .border_style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        });
    let inner = block.inner(area);

    app.chat_area = Some(inner);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.chat.messages() {
        let stamp = msg.sent_at.format("%H:%M").to_string();
        let author_line = match msg.author {
            Author::User => Line::from(vec![
                Span::styled("You", Style::default().fg(Color::Blue).bold()),
                Span::styled(format!("  {stamp}"), Style::default().fg(Color::Gray)),
            ]),
            Author::Assistant => Line::from(vec![
                Span::styled("CellMate", Style::default().fg(Color::Green).bold()),
                Span::styled(format!("  {stamp}"), Style::default().fg(Color::Gray)),
            ]),
        };
        lines.push(author_line);
        for text_line in msg.text.lines() {
            lines.push(Line::raw(text_line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.chat.pending() {
        lines.push(Line::from(Span::styled(
            "CellMate",
            Style::default().fg(Color::Green).bold(),
        )));
        let dots = ".".repeat(app.animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            dots,
            Style::default().fg(Color::Gray),
        )));
    }

    let transcript = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(transcript, area);

    let total = app.transcript_lines() as usize;
    if total > inner.height as usize {
        let mut state = ScrollbarState::new(total.saturating_sub(inner.height as usize))
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut state,
        );
    }
}

fn render_suggestions<G: TextGenerator>(app: &mut App<G>, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Try asking about ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.suggestion_areas.clear();
    let mut lines: Vec<Line> = Vec::new();
    for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled("? ", Style::default().fg(Color::Yellow)),
            Span::raw(*question),
        ]));
        let row = inner.y + i as u16;
        if row < inner.y + inner.height {
            app.suggestion_areas
                .push((i, Rect::new(inner.x, row, inner.width, 1)));
        }
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_input<G: TextGenerator>(app: &mut App<G>, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let pending = app.chat.pending();

    let title = if pending { " Ask (thinking) " } else { " Ask " };
    let border_style = if pending {
        Style::default().fg(Color::DarkGray)
    } else if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style);
    let inner = block.inner(area);
    app.input_area = Some(inner);

    // Horizontal scroll keeps the cursor visible once the question
    // outgrows the panel
    let width = inner.width as usize;
    let scroll = input_scroll_offset(app.input_cursor, width);

    let content = if app.input.is_empty() && !editing {
        Paragraph::new(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible: String = app.input.chars().skip(scroll).take(width).collect();
        Paragraph::new(visible)
    };
    frame.render_widget(content.block(block), area);

    if editing {
        let offset = ((app.input_cursor - scroll) as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(inner.x + offset, inner.y));
    }
}

/// First visible char index for the input line, chosen so the cursor always
/// lands inside the panel.
fn input_scroll_offset(cursor: usize, width: usize) -> usize {
    if width == 0 || cursor < width {
        0
    } else {
        cursor - width + 1
    }
}

fn render_viewer_panel<G: TextGenerator>(app: &mut App<G>, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Viewer;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" 3D Molecular Models ")
        .border_style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [selector_area, canvas_area, info_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(inner);

    render_variant_selector(app, frame, selector_area);
    render_canvas(app, frame, canvas_area);
    render_info(app, frame, info_area);
}

fn render_variant_selector<G: TextGenerator>(app: &mut App<G>, frame: &mut Frame, area: Rect) {
    app.variant_button_areas.clear();

    let active = app.viewer.variant();
    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    let mut x = area.x + 1;

    for variant in MoleculeVariant::all() {
        let label = format!(" {} ", variant.name());
        let width = label.chars().count() as u16;
        let style = if variant == active {
            Style::default().bg(Color::Blue).fg(Color::White).bold()
        } else {
            Style::default().bg(Color::DarkGray).fg(Color::Gray)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));

        app.variant_button_areas
            .push((variant, Rect::new(x, area.y, width, 1)));
        x += width + 1;
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Everything drawn on the canvas this frame, sorted far-to-near before
/// painting so close primitives overwrite distant ones.
struct SphereDraw {
    x: f64,
    y: f64,
    radius: f64,
    depth: f64,
    color: Color,
    label: Option<&'static str>,
    marker: Option<(f64, f64)>,
}

fn render_canvas<G: TextGenerator>(app: &mut App<G>, frame: &mut Frame, area: Rect) {
    app.canvas_area = Some(area);
    if area.width == 0 || area.height == 0 {
        return;
    }

    let viewer = &app.viewer;
    let variant = viewer.variant();
    let elapsed = viewer.elapsed();

    let (pitch, yaw) = variant.group_rotation(elapsed);
    let group = DMat4::from_rotation_x(pitch) * DMat4::from_rotation_y(yaw);
    let spin = DMat4::from_rotation_y(variant.primitive_spin_rate() * elapsed);

    // Terminal cells are roughly twice as tall as wide
    let aspect = area.width as f64 / (area.height as f64 * 2.0);
    let vp = viewer.camera.view_projection(aspect);

    let mut segments: Vec<(f64, f64, f64, f64, Color)> = Vec::new();
    for connector in &viewer.scene().backbone {
        let from = OrbitCamera::project(&vp, group.transform_point3(connector.from));
        let to = OrbitCamera::project(&vp, group.transform_point3(connector.to));
        if let (Some((x1, y1, _)), Some((x2, y2, _))) = (from, to) {
            segments.push((x1, y1, x2, y2, connector.color));
        }
    }

    let mut spheres: Vec<SphereDraw> = Vec::new();
    for primitive in &viewer.scene().primitives {
        let model = group * DMat4::from_translation(primitive.center) * spin;
        let Some((x, y, depth)) = OrbitCamera::project(&vp, model.transform_point3(DVec3::ZERO))
        else {
            continue;
        };

        // A dot on the equator makes the individual spin visible on an
        // otherwise featureless sphere.
        let marker = if primitive.spins {
            let surface = model.transform_point3(DVec3::new(primitive.radius, 0.0, 0.0));
            OrbitCamera::project(&vp, surface).map(|(mx, my, _)| (mx, my))
        } else {
            None
        };

        spheres.push(SphereDraw {
            x,
            y,
            radius: OrbitCamera::apparent_radius(primitive.radius, depth),
            depth,
            color: primitive.color,
            label: primitive.label,
            marker,
        });
    }
    spheres.sort_by(|a, b| b.depth.total_cmp(&a.depth));

    let canvas = Canvas::default()
        .marker(symbols::Marker::Braille)
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (x1, y1, x2, y2, color) in &segments {
                ctx.draw(&CanvasLine {
                    x1: *x1,
                    y1: *y1,
                    x2: *x2,
                    y2: *y2,
                    color: *color,
                });
            }
            for sphere in &spheres {
                ctx.draw(&Circle {
                    x: sphere.x,
                    y: sphere.y,
                    radius: sphere.radius,
                    color: sphere.color,
                });
                if let Some((mx, my)) = sphere.marker {
                    ctx.draw(&Points {
                        coords: &[(mx, my)],
                        color: Color::White,
                    });
                }
            }
            for sphere in &spheres {
                if let Some(label) = sphere.label {
                    ctx.print(
                        sphere.x,
                        sphere.y + sphere.radius * 1.6,
                        Line::from(Span::styled(label, Style::default().fg(Color::White).bold())),
                    );
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn render_info<G: TextGenerator>(app: &App<G>, frame: &mut Frame, area: Rect) {
    let variant = app.viewer.variant();
    let lines = vec![
        Line::from(Span::styled(
            format!("{} Structure", variant.name()),
            Style::default().bold(),
        )),
        Line::raw(variant.description()),
        Line::from(Span::styled(
            "Click and drag to rotate, scroll to zoom",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_footer<G: TextGenerator>(app: &App<G>, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " VIEW ",
        InputMode::Editing => " ASK ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    match app.input_mode {
        InputMode::Editing => hints.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" viewer ", label_style),
        ]),
        InputMode::Normal => {
            if app.focus == Focus::Viewer {
                hints.extend(vec![
                    Span::styled(" 1/2/3 ", key_style),
                    Span::styled(" structure ", label_style),
                    Span::styled(" h/l ", key_style),
                    Span::styled(" cycle ", label_style),
                ]);
            } else {
                hints.extend(vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                    Span::styled(" i ", key_style),
                    Span::styled(" ask ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
        }
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::future::Future;

    #[derive(Clone)]
    struct SilentGenerator;

    impl TextGenerator for SilentGenerator {
        fn generate(&self, _prompt: String) -> impl Future<Output = Result<String>> + Send {
            async { Ok(String::new()) }
        }
    }

    #[test]
    fn cursor_inside_panel_needs_no_scroll() {
        assert_eq!(input_scroll_offset(0, 20), 0);
        assert_eq!(input_scroll_offset(19, 20), 0);
        assert_eq!(input_scroll_offset(5, 0), 0);
    }

    #[test]
    fn cursor_past_panel_scrolls_minimally() {
        assert_eq!(input_scroll_offset(20, 20), 1);
        assert_eq!(input_scroll_offset(30, 20), 11);
    }

    #[test]
    fn long_input_scrolls_to_keep_cursor_visible() {
        // 22 wide leaves 20 inside the borders
        let mut terminal = Terminal::new(TestBackend::new(22, 3)).unwrap();
        let mut app = App::new(SilentGenerator);
        app.input = "abcdefghijABCDEFGHIJ0123456789".to_string();
        app.input_cursor = app.input.chars().count();

        terminal
            .draw(|frame| render_input(&mut app, frame, frame.area()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let row: String = (0..22).map(|x| buffer[(x, 1)].symbol()).collect();
        // tail of the question is on screen, scrolled-off head is not
        assert!(row.contains('9'));
        assert!(!row.contains('a'));

        // cursor sits just past the last char, inside the panel
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor, Position::new(20, 1));
    }

    #[test]
    fn cursor_in_the_middle_matches_its_char() {
        let mut terminal = Terminal::new(TestBackend::new(22, 3)).unwrap();
        let mut app = App::new(SilentGenerator);
        app.input = "abcdefghijABCDEFGHIJ0123456789".to_string();
        app.input_cursor = 25; // insertion point before '5'

        terminal
            .draw(|frame| render_input(&mut app, frame, frame.area()))
            .unwrap();

        let cursor = terminal.get_cursor_position().unwrap();
        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(cursor.x, cursor.y)].symbol(), "5");
    }
}
