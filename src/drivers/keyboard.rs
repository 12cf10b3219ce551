use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Smooths over platform differences in key reporting before events reach
/// the document.
///
/// Shift+Tab arrives as `Tab` with SHIFT on some terminals and as `BackTab`
/// on others; both become `BackTab`. Releases are dropped everywhere and, on
/// Windows, so are repeats and the duplicate Escape presses its console
/// reports while the key is held.
#[derive(Debug, Default)]
pub struct KeyboardNormalizer {
    esc_down: bool,
}

impl KeyboardNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, event: Event) -> Option<Event> {
        match event {
            Event::Key(key) => self.normalize_key(key).map(Event::Key),
            other => Some(other),
        }
    }

    pub fn normalize_key(&mut self, mut key: KeyEvent) -> Option<KeyEvent> {
        if key.code == KeyCode::Tab && key.modifiers.contains(KeyModifiers::SHIFT) {
            key.code = KeyCode::BackTab;
            key.modifiers.remove(KeyModifiers::SHIFT);
        }
        if key.kind == KeyEventKind::Release {
            if key.code == KeyCode::Esc {
                self.esc_down = false;
            }
            return None;
        }
        if cfg!(windows) {
            if key.kind == KeyEventKind::Repeat {
                return None;
            }
            let is_esc = key.code == KeyCode::Esc;
            if is_esc && self.esc_down {
                return None;
            }
            self.esc_down = is_esc;
        }
        Some(key)
    }
}
