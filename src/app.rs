use ratatui::layout::Rect;

use crate::chat::{ChatSession, TextGenerator, SUGGESTED_QUESTIONS};
use crate::scene::MoleculeVariant;
use crate::viewer::Viewer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Chat,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App<G: TextGenerator> {
    pub should_quit: bool,
    pub focus: Focus,
    pub input_mode: InputMode,

    // The two live sub-systems. They share no state.
    pub chat: ChatSession<G>,
    pub viewer: Viewer,

    // Question being composed
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // Chat transcript scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // viewport size from last render, for scroll math
    pub chat_width: u16,

    // 0-2, drives the thinking ellipsis
    pub animation_frame: u8,
    tick_count: u32,
    seen_messages: usize,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub input_area: Option<Rect>,
    pub canvas_area: Option<Rect>,
    pub variant_button_areas: Vec<(MoleculeVariant, Rect)>,
    pub suggestion_areas: Vec<(usize, Rect)>,
}

impl<G: TextGenerator> App<G> {
    pub fn new(client: G) -> Self {
        Self {
            should_quit: false,
            focus: Focus::Input,
            input_mode: InputMode::Editing,

            chat: ChatSession::new(client),
            viewer: Viewer::new(),

            input: String::new(),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,
            tick_count: 0,
            seen_messages: 1, // the greeting

            chat_area: None,
            input_area: None,
            canvas_area: None,
            variant_button_areas: Vec::new(),
            suggestion_areas: Vec::new(),
        }
    }

    /// Submit the composed question. On an accepted submission the input
    /// buffer is cleared; blank or concurrent submissions leave it intact.
    pub fn submit_input(&mut self) {
        let text = self.input.clone();
        if self.chat.submit(&text) {
            self.input.clear();
            self.input_cursor = 0;
            self.scroll_chat_to_bottom();
        }
    }

    /// Per-frame update: advance the ellipsis, fold pointer input into the
    /// camera, and keep the transcript pinned to the newest message.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        // Frames arrive every ~33ms; step the ellipsis about 3 times a second
        if self.chat.pending() && self.tick_count % 9 == 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.viewer.tick();

        let count = self.chat.messages().len();
        if count > self.seen_messages {
            self.seen_messages = count;
            self.scroll_chat_to_bottom();
        }
    }

    /// Suggested questions are shown only while the transcript is just the
    /// greeting.
    pub fn show_suggestions(&self) -> bool {
        self.chat.messages().len() == 1
    }

    pub fn apply_suggestion(&mut self, index: usize) {
        if let Some(question) = SUGGESTED_QUESTIONS.get(index) {
            self.input = question.to_string();
            self.input_cursor = self.input.chars().count();
            self.focus = Focus::Input;
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.transcript_lines().saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let total = self.transcript_lines();
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_scroll = total.saturating_sub(visible);
    }

    /// Rendered height of the transcript, mirroring the word wrap the chat
    /// panel applies. Scroll clamping depends on this matching the renderer.
    pub fn transcript_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in self.chat.messages() {
            total += 1; // author line
            for line in msg.text.lines() {
                total += wrapped_rows(line, wrap_width);
            }
            total += 1; // blank line after message
        }

        if self.chat.pending() {
            total += 2; // author line + ellipsis
        }
        total
    }
}

/// Rows one source line occupies after word wrapping at `width`, tracking
/// the same state machine the transcript paragraph runs: a word that no
/// longer fits moves to the next row whole, a word wider than the panel
/// breaks at the edge, and pending whitespace is dropped at each break.
fn wrapped_rows(line: &str, width: usize) -> u16 {
    if width == 0 {
        return 1;
    }
    let mut rows: u16 = 1;
    let mut row_started = false;
    let mut line_w = 0usize; // committed row width
    let mut ws_w = 0usize; // pending whitespace run
    let mut word_w = 0usize; // pending word
    let mut prev_word = false;

    for ch in line.chars() {
        let is_ws = ch.is_whitespace();

        // the pending word ended, or alone it already fills the row
        if (prev_word && is_ws) || (line_w == 0 && word_w + ws_w + 1 > width) {
            line_w += ws_w + word_w;
            ws_w = 0;
            word_w = 0;
        }

        // row is full, or the pending word would overflow it
        if line_w >= width || line_w + ws_w + word_w >= width {
            rows += 1;
            row_started = false;
            let dropped = ws_w.min(width.saturating_sub(line_w));
            ws_w -= dropped;
            line_w = 0;
            if is_ws && ws_w == 0 {
                prev_word = false;
                continue;
            }
        }

        if is_ws {
            ws_w += 1;
        } else {
            word_w += 1;
        }
        row_started = true;
        prev_word = !is_ws;
    }

    // a break on the final symbol leaves no trailing row behind it
    if !row_started && rows > 1 {
        rows -= 1;
    }
    rows
}
