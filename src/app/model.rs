//! Application model types: `App` and `InputMode`.

/// What keystrokes currently feed.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing a file or directory to add.
    AddPath(String),
}

/// Cursor and popup state of the playlist view.
#[derive(Debug, Default)]
pub struct App {
    pub selected: usize,
    pub follow_playback: bool,
    pub metadata_window: bool,
    pub input: InputMode,
    /// First `g` of a `gg` was pressed.
    pub pending_gg: bool,
    last_current: Option<usize>,
}

impl App {
    pub fn new(follow_playback: bool) -> Self {
        Self {
            follow_playback,
            ..Self::default()
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected.min(len - 1) + 1) % len;
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self, len: usize) {
        if len > 0 {
            let cur = self.selected.min(len - 1);
            self.selected = (cur + len - 1) % len;
        }
    }

    pub fn top(&mut self) {
        self.selected = 0;
    }

    pub fn bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Keep the cursor inside the list and, when following, on the current
    /// track whenever that changes.
    pub fn sync_with_playback(&mut self, current: Option<usize>, len: usize) {
        if current != self.last_current {
            self.last_current = current;
            if let (true, Some(idx)) = (self.follow_playback, current) {
                self.selected = idx;
            }
        }
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.input, InputMode::AddPath(_))
    }

    pub fn begin_add_path(&mut self) {
        self.pending_gg = false;
        self.input = InputMode::AddPath(String::new());
    }

    pub fn push_input_char(&mut self, c: char) {
        if let InputMode::AddPath(buf) = &mut self.input {
            buf.push(c);
        }
    }

    pub fn pop_input_char(&mut self) {
        if let InputMode::AddPath(buf) = &mut self.input {
            buf.pop();
        }
    }

    pub fn cancel_input(&mut self) {
        self.input = InputMode::Normal;
    }

    /// Leave the prompt, returning what was typed unless it is blank.
    pub fn submit_input(&mut self) -> Option<String> {
        match std::mem::take(&mut self.input) {
            InputMode::AddPath(buf) => Some(buf.trim().to_string()).filter(|s| !s.is_empty()),
            InputMode::Normal => None,
        }
    }
}
