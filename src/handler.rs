use anyhow::Result;
use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::{App, Focus, InputMode};
use crate::chat::TextGenerator;
use crate::scene::MoleculeVariant;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event<G: TextGenerator>(app: &mut App<G>, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
    Ok(())
}

fn handle_key<G: TextGenerator>(app: &mut App<G>, key: KeyEvent) {
    // Works in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode<G: TextGenerator>(app: &mut App<G>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Focus cycle: Chat -> Viewer -> Input
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Chat => Focus::Viewer,
                Focus::Viewer => Focus::Input,
                Focus::Input => Focus::Chat,
            };
            if app.focus == Focus::Input {
                app.input_mode = InputMode::Editing;
                app.input_cursor = app.input.chars().count();
            }
        }

        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = Focus::Input;
            app.input_mode = InputMode::Editing;
            app.input_cursor = app.input.chars().count();
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down if app.focus == Focus::Chat => {
            app.scroll_chat_down(1);
        }
        KeyCode::Char('k') | KeyCode::Up if app.focus == Focus::Chat => {
            app.scroll_chat_up(1);
        }
        KeyCode::Char('g') if app.focus == Focus::Chat => app.chat_scroll = 0,
        KeyCode::Char('G') if app.focus == Focus::Chat => app.scroll_chat_to_bottom(),

        // Structure selection
        KeyCode::Char('1') => app.viewer.select(MoleculeVariant::Dna),
        KeyCode::Char('2') => app.viewer.select(MoleculeVariant::Protein),
        KeyCode::Char('3') => app.viewer.select(MoleculeVariant::Cell),
        KeyCode::Char('l') | KeyCode::Right if app.focus == Focus::Viewer => {
            app.viewer.select_next();
        }
        KeyCode::Char('h') | KeyCode::Left if app.focus == Focus::Viewer => {
            app.viewer.select_prev();
        }

        _ => {}
    }
}

fn handle_editing_mode<G: TextGenerator>(app: &mut App<G>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.focus = Focus::Chat;
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = Focus::Viewer;
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse<G: TextGenerator>(app: &mut App<G>, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_canvas = app.canvas_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_input = app.input_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some((variant, _)) = app
                .variant_button_areas
                .iter()
                .find(|(_, rect)| point_in_rect(x, y, *rect))
            {
                app.viewer.select(*variant);
            } else if let Some((index, _)) = app
                .suggestion_areas
                .iter()
                .find(|(_, rect)| point_in_rect(x, y, *rect))
            {
                app.apply_suggestion(*index);
            } else if in_canvas {
                app.focus = Focus::Viewer;
                app.input_mode = InputMode::Normal;
                app.viewer.pointer_down(x, y);
            } else if in_input {
                app.focus = Focus::Input;
                app.input_mode = InputMode::Editing;
                app.input_cursor = app.input.chars().count();
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if in_canvas {
                app.viewer.pointer_drag(x, y);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.viewer.pointer_up();
        }
        MouseEventKind::ScrollDown => {
            if in_canvas {
                app.viewer.pointer_scroll(-1.0);
            } else if in_chat {
                app.scroll_chat_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_canvas {
                app.viewer.pointer_scroll(1.0);
            } else if in_chat {
                app.scroll_chat_up(3);
            }
        }
        _ => {}
    }
}
