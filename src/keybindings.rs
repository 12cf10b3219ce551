use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    // Focus/tab navigation
    FocusNext,
    FocusPrev,
    // Overlay
    Dismiss,
    Activate,
    // Demo log panel
    ToggleLog,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Quit => "quit",
            Action::FocusNext => "focus next",
            Action::FocusPrev => "focus previous",
            Action::Dismiss => "close the innermost popover",
            Action::Activate => "activate",
            Action::ToggleLog => "toggle the log panel",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        key.code == self.code && key.modifiers == self.mods
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.mods.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.mods.contains(KeyModifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.mods.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        let code = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "BackTab".to_string(),
            KeyCode::F(n) => format!("F{}", n),
            _ => format!("{:?}", self.code),
        };
        parts.push(code);
        parts.join("+")
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<Action, Vec<KeyCombo>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Action::*;
        let mut kb = Self::new();
        kb.add(
            Quit,
            KeyCombo::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
        );
        kb.add(FocusNext, KeyCombo::new(KeyCode::Tab, KeyModifiers::NONE));
        // Terminals disagree on how Shift+Tab arrives; accept every shape.
        kb.add(
            FocusPrev,
            KeyCombo::new(KeyCode::BackTab, KeyModifiers::NONE),
        );
        kb.add(
            FocusPrev,
            KeyCombo::new(KeyCode::BackTab, KeyModifiers::SHIFT),
        );
        kb.add(FocusPrev, KeyCombo::new(KeyCode::Tab, KeyModifiers::SHIFT));
        kb.add(Dismiss, KeyCombo::new(KeyCode::Esc, KeyModifiers::NONE));
        kb.add(Activate, KeyCombo::new(KeyCode::Enter, KeyModifiers::NONE));
        kb.add(
            Activate,
            KeyCombo::new(KeyCode::Char(' '), KeyModifiers::NONE),
        );
        kb.add(ToggleLog, KeyCombo::new(KeyCode::F(12), KeyModifiers::NONE));
        kb
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Process-wide default bindings used by the document's default actions.
    pub fn global() -> &'static KeyBindings {
        static GLOBAL: OnceLock<KeyBindings> = OnceLock::new();
        GLOBAL.get_or_init(KeyBindings::default)
    }

    pub fn add(&mut self, action: Action, combo: KeyCombo) {
        self.map.entry(action).or_default().push(combo);
    }

    pub fn matches(&self, action: Action, key: &KeyEvent) -> bool {
        if let Some(list) = self.map.get(&action) {
            list.iter().any(|c| c.matches(key))
        } else {
            false
        }
    }

    /// Return the display strings for all combos mapped to `action`.
    pub fn combos_for(&self, action: Action) -> Vec<String> {
        self.map
            .get(&action)
            .map(|list| list.iter().map(KeyCombo::to_string).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_quit() {
        let kb = KeyBindings::default();
        let ev = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(kb.matches(Action::Quit, &ev));
    }

    #[test]
    fn shift_tab_variants_all_focus_prev() {
        let kb = KeyBindings::global();
        for ev in [
            KeyEvent::new(KeyCode::BackTab, KeyModifiers::NONE),
            KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT),
        ] {
            assert!(kb.matches(Action::FocusPrev, &ev));
            assert!(!kb.matches(Action::FocusNext, &ev));
        }
    }

    #[test]
    fn combos_display_in_binding_order() {
        let kb = KeyBindings::default();
        assert_eq!(kb.combos_for(Action::Activate), vec!["Enter", "Space"]);
        assert_eq!(kb.combos_for(Action::Quit), vec!["Ctrl+Q"]);
        assert_eq!(
            KeyCombo::new(KeyCode::Tab, KeyModifiers::SHIFT).to_string(),
            "Shift+Tab"
        );
    }
}
