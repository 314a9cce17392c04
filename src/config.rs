//! User configuration: service endpoint, reveal speed, preferences and
//! keybindings.
//!
//! Stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/juris/config.toml` (default `~/.config/juris/config.toml`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::reveal::Cadence;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:9095";

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    Select,
    Back,
    NextPage,
    PrevPage,
    Refresh,
    Upload,
    RunReview,
    Checklist,
    GoContracts,
    GoAnalytics,
    GoProfile,
    Logout,
    OpenSettings,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the controls menu).
    pub const ALL: &[Action] = &[
        Action::MoveUp,
        Action::MoveDown,
        Action::Select,
        Action::Back,
        Action::NextPage,
        Action::PrevPage,
        Action::Refresh,
        Action::Upload,
        Action::RunReview,
        Action::Checklist,
        Action::GoContracts,
        Action::GoAnalytics,
        Action::GoProfile,
        Action::Logout,
        Action::OpenSettings,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::MoveUp => "Move Up",
            Action::MoveDown => "Move Down",
            Action::Select => "Open / Explain",
            Action::Back => "Back",
            Action::NextPage => "Next Page",
            Action::PrevPage => "Previous Page",
            Action::Refresh => "Refresh",
            Action::Upload => "Upload Contract",
            Action::RunReview => "Run Review",
            Action::Checklist => "Summary Checklist",
            Action::GoContracts => "Contracts",
            Action::GoAnalytics => "Analytics",
            Action::GoProfile => "Profile",
            Action::Logout => "Logout",
            Action::OpenSettings => "Open Settings",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::MoveUp => "move_up",
            Action::MoveDown => "move_down",
            Action::Select => "select",
            Action::Back => "back",
            Action::NextPage => "next_page",
            Action::PrevPage => "prev_page",
            Action::Refresh => "refresh",
            Action::Upload => "upload",
            Action::RunReview => "run_review",
            Action::Checklist => "checklist",
            Action::GoContracts => "go_contracts",
            Action::GoAnalytics => "go_analytics",
            Action::GoProfile => "go_profile",
            Action::Logout => "logout",
            Action::OpenSettings => "open_settings",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    const MOD_MASK: KeyModifiers = KeyModifiers::CONTROL
        .union(KeyModifiers::ALT)
        .union(KeyModifiers::SHIFT);

    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared.  SHIFT is ignored for printable characters, whose case
    /// already carries it.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mut mask = Self::MOD_MASK;
        if matches!(self.code, KeyCode::Char(_)) {
            mask.remove(KeyModifiers::SHIFT);
        }
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Create a binding from a raw key event (used during rebinding).
    pub fn from_key_event(event: KeyEvent) -> Self {
        let mut modifiers = event.modifiers & Self::MOD_MASK;
        if matches!(event.code, KeyCode::Char(_)) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        Self {
            code: event.code,
            modifiers,
        }
    }

    fn modifier_prefix(&self) -> String {
        MODIFIER_NAMES
            .iter()
            .filter(|(m, _)| self.modifiers.contains(*m))
            .map(|(_, name)| format!("{name}+"))
            .collect()
    }

    fn named(&self) -> Option<&'static NamedKey> {
        NAMED_KEYS.iter().find(|k| k.code == self.code)
    }

    /// Status bar / controls popup form, e.g. `Ctrl+r`, `PgDn`, `↑`.
    pub fn display(&self) -> String {
        let key = match (self.named(), self.code) {
            (Some(named), _) => named.glyph.to_string(),
            (None, KeyCode::Char(c)) => c.to_string(),
            (None, KeyCode::F(n)) => format!("F{n}"),
            (None, other) => format!("{other:?}"),
        };
        format!("{}{key}", self.modifier_prefix())
    }

    /// Config-file form, e.g. `Ctrl+r`, `PageDown`, `Up`.
    fn to_config_string(&self) -> String {
        let key = match (self.named(), self.code) {
            (Some(named), _) => named.names[0].to_string(),
            (None, KeyCode::Char(c)) => c.to_string(),
            (None, KeyCode::F(n)) => format!("F{n}"),
            (None, other) => format!("{other:?}"),
        };
        format!("{}{key}", self.modifier_prefix())
    }

    /// Inverse of [`KeyBind::to_config_string`].  Named keys and modifiers
    /// are case-insensitive; single characters keep their case (`R` ≠ `r`).
    fn parse(s: &str) -> Option<Self> {
        let (mods, key) = match s.rsplit_once('+') {
            // `+` and `Ctrl++` bind the plus key.
            Some(("", "")) => ("", "+"),
            Some((mods, "")) => (mods.strip_suffix('+')?, "+"),
            Some((mods, key)) => (mods, key),
            None => ("", s),
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in mods.split('+').filter(|p| !p.is_empty()) {
            let (m, _) = MODIFIER_NAMES
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(part))?;
            modifiers |= *m;
        }

        let mut chars = key.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => {
                let lower = key.to_lowercase();
                match NAMED_KEYS.iter().find(|k| k.names.contains(&lower.as_str())) {
                    Some(named) => named.code,
                    None => KeyCode::F(lower.strip_prefix('f')?.parse().ok()?),
                }
            }
        };
        Some(Self { code, modifiers })
    }
}

const MODIFIER_NAMES: &[(KeyModifiers, &str)] = &[
    (KeyModifiers::CONTROL, "Ctrl"),
    (KeyModifiers::ALT, "Alt"),
    (KeyModifiers::SHIFT, "Shift"),
];

/// Non-character keys.  `names[0]` is written to the config file; every
/// entry of `names` (lowercase) is accepted when reading it back.
struct NamedKey {
    code: KeyCode,
    names: &'static [&'static str],
    glyph: &'static str,
}

const NAMED_KEYS: &[NamedKey] = &[
    NamedKey { code: KeyCode::Up, names: &["Up", "up"], glyph: "↑" },
    NamedKey { code: KeyCode::Down, names: &["Down", "down"], glyph: "↓" },
    NamedKey { code: KeyCode::Left, names: &["Left", "left"], glyph: "←" },
    NamedKey { code: KeyCode::Right, names: &["Right", "right"], glyph: "→" },
    NamedKey { code: KeyCode::Enter, names: &["Enter", "enter", "return"], glyph: "Enter" },
    NamedKey { code: KeyCode::Esc, names: &["Esc", "esc", "escape"], glyph: "Esc" },
    NamedKey { code: KeyCode::Tab, names: &["Tab", "tab"], glyph: "Tab" },
    NamedKey { code: KeyCode::Backspace, names: &["Backspace", "backspace", "bksp"], glyph: "Bksp" },
    NamedKey { code: KeyCode::Delete, names: &["Delete", "delete", "del"], glyph: "Del" },
    NamedKey { code: KeyCode::Home, names: &["Home", "home"], glyph: "Home" },
    NamedKey { code: KeyCode::End, names: &["End", "end"], glyph: "End" },
    NamedKey { code: KeyCode::PageUp, names: &["PageUp", "pageup", "pgup"], glyph: "PgUp" },
    NamedKey { code: KeyCode::PageDown, names: &["PageDown", "pagedown", "pgdn"], glyph: "PgDn" },
    NamedKey { code: KeyCode::Char(' '), names: &["Space", "space"], glyph: "Space" },
];

// ───────────────────────────────────────── preferences ───────

/// How clause explanations are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplainTransport {
    /// Reveal chunks as the service streams them.
    #[default]
    Stream,
    /// Wait for the whole explanation, then replay it.
    Buffered,
}

impl ExplainTransport {
    pub const ALL: &[ExplainTransport] = &[ExplainTransport::Stream, ExplainTransport::Buffered];

    pub fn label(self) -> &'static str {
        match self {
            ExplainTransport::Stream => "stream",
            ExplainTransport::Buffered => "buffered",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.label() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub const ALL: &[ThemeMode] = &[ThemeMode::Dark, ThemeMode::Light];

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.label() == s)
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration: keybindings and preferences.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// Service root, without the `/v1` suffix.
    pub endpoint: String,
    /// Per-character reveal delay.
    pub cadence_ms: u64,
    /// Extra pause between streamed chunks.
    pub chunk_gap_ms: u64,
    pub transport: ExplainTransport,
    /// Contracts per page in the history view.
    pub page_size: u32,
    pub theme: ThemeMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cadence_ms: 2,
            chunk_gap_ms: 2,
            transport: ExplainTransport::default(),
            page_size: 20,
            theme: ThemeMode::default(),
        }
    }
}

impl AppConfig {
    /// Built-in keybindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(MoveUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(MoveDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(Select, vec![KeyBind::new(Enter, n), KeyBind::new(Right, n)]);
        m.insert(Back, vec![KeyBind::new(Left, n), KeyBind::new(Backspace, n)]);
        m.insert(NextPage, vec![KeyBind::new(PageDown, n), KeyBind::new(Char(']'), n)]);
        m.insert(PrevPage, vec![KeyBind::new(PageUp, n), KeyBind::new(Char('['), n)]);
        m.insert(Refresh, vec![KeyBind::new(Char('r'), n), KeyBind::new(F(5), n)]);
        m.insert(Upload, vec![KeyBind::new(Char('u'), n)]);
        m.insert(RunReview, vec![KeyBind::new(Char('v'), n)]);
        m.insert(Checklist, vec![KeyBind::new(Char('c'), n)]);
        m.insert(GoContracts, vec![KeyBind::new(Char('d'), n)]);
        m.insert(GoAnalytics, vec![KeyBind::new(Char('a'), n)]);
        m.insert(GoProfile, vec![KeyBind::new(Char('p'), n)]);
        m.insert(Logout, vec![KeyBind::new(Char('L'), n)]);
        m.insert(OpenSettings, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    pub fn cadence(&self) -> Cadence {
        Cadence::from_millis(self.cadence_ms, self.chunk_gap_ms)
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Add a binding for `action`.  Removes this key from any other action
    /// to prevent conflicts, then appends it to `action`'s bindings.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for (_, binds) in self.bindings.iter_mut() {
            binds.retain(|b| b != &bind);
        }
        self.bindings.entry(action).or_default().push(bind);
    }

    /// Restore all bindings to the built-in defaults.
    pub fn reset_defaults(&mut self) {
        self.bindings = Self::default_bindings();
    }

    /// Format the binding list for a given action (e.g. `"↑/k"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(|b| b.display()).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    /// Short display of the first binding only (for the status bar).
    pub fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Status-bar hint built from the current bindings.
    pub fn status_bar_hint(&self, actions: &[Action]) -> String {
        actions
            .iter()
            .map(|&a| format!("{}: {}", self.short_binding(a), a.label().to_lowercase()))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents),
            Err(_) => Self::default(),
        }
    }

    /// Persist current config to the default location.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match key {
                "endpoint" => {
                    if !value.is_empty() {
                        config.endpoint = value.to_string();
                    }
                    continue;
                }
                "cadence_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.cadence_ms = v.clamp(1, 200);
                    }
                    continue;
                }
                "chunk_gap_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.chunk_gap_ms = v.min(1000);
                    }
                    continue;
                }
                "transport" => {
                    if let Some(t) = ExplainTransport::parse(value) {
                        config.transport = t;
                    }
                    continue;
                }
                "page_size" => {
                    if let Ok(v) = value.parse::<u32>() {
                        config.page_size = v.clamp(1, 200);
                    }
                    continue;
                }
                "theme" => {
                    if let Some(t) = ThemeMode::parse(value) {
                        config.theme = t;
                    }
                    continue;
                }
                _ => {}
            }

            let Some(action) = Action::from_config_key(key) else {
                continue;
            };

            let mut parsed = Vec::new();
            for part in value.split(',') {
                let part = part.trim().trim_matches('"');
                if let Some(bind) = KeyBind::parse(part) {
                    parsed.push(bind);
                }
            }
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# juris configuration".to_string(),
            String::new(),
            "# Service".to_string(),
            format!("endpoint = \"{}\"", self.endpoint),
            format!("transport = \"{}\"", self.transport.label()),
            String::new(),
            "# Display".to_string(),
            format!("cadence_ms = {}", self.cadence_ms),
            format!("chunk_gap_ms = {}", self.chunk_gap_ms),
            format!("page_size = {}", self.page_size),
            format!("theme = \"{}\"", self.theme.label()),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Backspace, Delete, Home, End, PageUp, PageDown, Space, F1-F12".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/juris/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("juris").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn parses_preferences_and_bindings() {
        let config = AppConfig::parse_config(
            "# comment\n\
             endpoint = \"https://api.example.com\"\n\
             cadence_ms = 0\n\
             chunk_gap_ms = 15\n\
             transport = buffered\n\
             theme = light\n\
             page_size = 5\n\
             quit = Ctrl+q, Esc\n\
             bogus = x\n",
        );

        assert_eq!(config.endpoint, "https://api.example.com");
        assert_eq!(config.cadence_ms, 1, "cadence is clamped to at least 1ms");
        assert_eq!(config.chunk_gap_ms, 15);
        assert_eq!(config.transport, ExplainTransport::Buffered);
        assert_eq!(config.theme, ThemeMode::Light);
        assert_eq!(config.page_size, 5);
        assert_eq!(
            config.match_key(key(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(config.match_key(key(KeyCode::Char('q'), KeyModifiers::NONE)), None);
        assert_eq!(config.cadence(), Cadence::from_millis(1, 15));
    }

    #[test]
    fn saved_config_loads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("juris").join("config.toml");

        let mut config = AppConfig::default();
        config.endpoint = "http://10.0.0.2:9095".into();
        config.transport = ExplainTransport::Buffered;
        config.add_binding(Action::Refresh, KeyBind::new(KeyCode::Char('R'), KeyModifiers::NONE));
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.endpoint, "http://10.0.0.2:9095");
        assert_eq!(loaded.transport, ExplainTransport::Buffered);
        assert_eq!(loaded.bindings, config.bindings);
    }

    #[test]
    fn uppercase_binding_matches_shifted_key() {
        let config = AppConfig::default();
        assert_eq!(
            config.match_key(key(KeyCode::Char('L'), KeyModifiers::SHIFT)),
            Some(Action::Logout)
        );
        assert_eq!(
            config.match_key(key(KeyCode::Char('l'), KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn rebinding_steals_key_from_other_action() {
        let mut config = AppConfig::default();
        config.add_binding(Action::Upload, KeyBind::new(KeyCode::Char('r'), KeyModifiers::NONE));
        assert_eq!(
            config.match_key(key(KeyCode::Char('r'), KeyModifiers::NONE)),
            Some(Action::Upload)
        );
        assert_eq!(config.display_bindings(Action::Refresh), "F5");
    }

    #[test]
    fn key_names_parse_and_print() {
        let bind = KeyBind::parse("ctrl+pgdn").unwrap();
        assert_eq!(bind, KeyBind::new(KeyCode::PageDown, KeyModifiers::CONTROL));
        assert_eq!(bind.to_config_string(), "Ctrl+PageDown");
        assert_eq!(bind.display(), "Ctrl+PgDn");

        assert_eq!(KeyBind::parse("F5"), Some(KeyBind::new(KeyCode::F(5), KeyModifiers::NONE)));
        assert_eq!(KeyBind::parse("Space").map(|b| b.code), Some(KeyCode::Char(' ')));
        assert_eq!(
            KeyBind::parse("Ctrl++"),
            Some(KeyBind::new(KeyCode::Char('+'), KeyModifiers::CONTROL))
        );
        assert_eq!(KeyBind::parse("Hyper+x"), None);
        assert_eq!(KeyBind::parse("nonsense"), None);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/juris/config.toml"));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.cadence(), Cadence::default());
    }
}
