//! Text input and the small forms built from it: sign-in/registration, the
//! upload prompt, and the review options popup.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::model::{
    ContractIndustry, ContractJurisdiction, ContractType, RegisterRequest, ReviewRequest,
};

/// Single-line editable text.  `cursor` is a char index.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub label: &'static str,
    value: String,
    cursor: usize,
    /// Render as bullets (passwords).
    pub masked: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    pub fn masked(label: &'static str) -> Self {
        Self {
            label,
            masked: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// What the UI should draw.
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Insert at the cursor.  Newlines are dropped.
    pub fn insert_str(&mut self, text: &str) {
        for ch in text.chars().filter(|c| !c.is_control()) {
            let at = self.byte_index(self.cursor);
            self.value.insert(at, ch);
            self.cursor += 1;
        }
    }

    /// Apply an editing key.  Returns `false` for keys the field ignores.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let len = self.value.chars().count();
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.insert_str(&ch.to_string());
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < len {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            _ => return false,
        }
        true
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }
}

/// Result of routing a key into a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    /// Key consumed, nothing else to do.
    Edited,
    Submit,
    Cancel,
    Ignored,
}

/// Shared focus handling for a column of fields: Tab/↓ and Shift-Tab/↑
/// move between them, Enter on the last one submits.
fn route_key(fields: &mut [TextField], focus: &mut usize, key: KeyEvent) -> FormOutcome {
    let last = fields.len().saturating_sub(1);
    match key.code {
        KeyCode::Esc => FormOutcome::Cancel,
        KeyCode::Tab | KeyCode::Down => {
            *focus = if *focus >= last { 0 } else { *focus + 1 };
            FormOutcome::Edited
        }
        KeyCode::BackTab | KeyCode::Up => {
            *focus = if *focus == 0 { last } else { *focus - 1 };
            FormOutcome::Edited
        }
        KeyCode::Enter if *focus >= last => FormOutcome::Submit,
        KeyCode::Enter => {
            *focus += 1;
            FormOutcome::Edited
        }
        _ => match fields.get_mut(*focus) {
            Some(field) => {
                if field.handle_key(key) {
                    FormOutcome::Edited
                } else {
                    FormOutcome::Ignored
                }
            }
            None => FormOutcome::Ignored,
        },
    }
}

// ───────────────────────────────────────── auth ──────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// The sign-in / registration form.  Registration adds first and last name
/// fields and a terms checkbox that must be ticked before submitting.
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub fields: Vec<TextField>,
    pub focus: usize,
    pub accept_terms: bool,
    /// A request is in flight; further submits are ignored.
    pub submitting: bool,
}

impl AuthForm {
    pub fn login() -> Self {
        Self {
            mode: AuthMode::Login,
            fields: vec![TextField::new("Email"), TextField::masked("Password")],
            focus: 0,
            accept_terms: false,
            submitting: false,
        }
    }

    pub fn register() -> Self {
        Self {
            mode: AuthMode::Register,
            fields: vec![
                TextField::new("First Name"),
                TextField::new("Last Name"),
                TextField::new("Email"),
                TextField::masked("Password"),
            ],
            focus: 0,
            accept_terms: false,
            submitting: false,
        }
    }

    fn field(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map_or("", |f| f.value())
    }

    pub fn email(&self) -> &str {
        self.field("Email").trim()
    }

    pub fn password(&self) -> &str {
        self.field("Password")
    }

    /// Why the form can't be submitted yet, if anything.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email().is_empty() || !self.email().contains('@') {
            return Err("Enter a valid email address");
        }
        if self.password().is_empty() {
            return Err("Enter a password");
        }
        if self.mode == AuthMode::Register && !self.accept_terms {
            return Err("Accept the terms and conditions to continue");
        }
        Ok(())
    }

    pub fn register_request(&self) -> RegisterRequest {
        let optional = |label: &str| {
            let value = self.field(label).trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        RegisterRequest {
            email: self.email().to_string(),
            password: self.password().to_string(),
            first_name: optional("First Name"),
            last_name: optional("Last Name"),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        if self.mode == AuthMode::Register
            && key.code == KeyCode::Char('t')
            && key.modifiers.contains(KeyModifiers::CONTROL)
        {
            self.accept_terms = !self.accept_terms;
            return FormOutcome::Edited;
        }
        route_key(&mut self.fields, &mut self.focus, key)
    }

    pub fn paste(&mut self, text: &str) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.insert_str(text);
        }
    }
}

// ───────────────────────────────────────── upload ────────────

/// Path + title prompt shown before uploading a PDF.
#[derive(Debug, Clone)]
pub struct UploadPrompt {
    pub fields: Vec<TextField>,
    pub focus: usize,
}

impl Default for UploadPrompt {
    fn default() -> Self {
        Self {
            fields: vec![TextField::new("PDF path"), TextField::new("Title")],
            focus: 0,
        }
    }
}

impl UploadPrompt {
    pub fn path(&self) -> &str {
        self.fields[0].value().trim()
    }

    /// The entered title, or the file stem when left blank.
    pub fn title(&self) -> String {
        let title = self.fields[1].value().trim();
        if !title.is_empty() {
            return title.to_string();
        }
        std::path::Path::new(self.path())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        route_key(&mut self.fields, &mut self.focus, key)
    }

    pub fn paste(&mut self, text: &str) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.insert_str(text.trim());
        }
    }
}

// ───────────────────────────────────────── review options ────

/// Jurisdiction / industry / contract type picked before a review runs.
#[derive(Debug, Clone)]
pub struct ReviewForm {
    pub contract_id: String,
    pub title: String,
    pub request: ReviewRequest,
    /// Highlighted row: 0..3 are the options, 3 is "Start review".
    pub selected: usize,
}

impl ReviewForm {
    pub const ROWS: usize = 4;

    pub fn new(contract_id: String, title: String) -> Self {
        Self {
            contract_id,
            title,
            request: ReviewRequest::default(),
            selected: 0,
        }
    }

    /// `(label, value)` per option row.
    pub fn rows(&self) -> [(&'static str, &'static str); 3] {
        [
            ("Jurisdiction", self.request.jurisdiction.label()),
            ("Industry", self.request.industry.label()),
            ("Contract Type", self.request.contract_type.label()),
        ]
    }

    pub fn cycle_selected(&mut self) {
        match self.selected {
            0 => self.request.jurisdiction = self.request.jurisdiction.cycle(),
            1 => self.request.industry = self.request.industry.cycle(),
            2 => self.request.contract_type = self.request.contract_type.cycle(),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => FormOutcome::Cancel,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                FormOutcome::Edited
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected = (self.selected + 1).min(Self::ROWS - 1);
                FormOutcome::Edited
            }
            KeyCode::Enter if self.selected == Self::ROWS - 1 => FormOutcome::Submit,
            KeyCode::Enter | KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('l') => {
                self.cycle_selected();
                FormOutcome::Edited
            }
            _ => FormOutcome::Ignored,
        }
    }
}

/// Review-option values, defaulting to `Other` like the service does.
pub fn review_request(
    jurisdiction: Option<ContractJurisdiction>,
    industry: Option<ContractIndustry>,
    contract_type: Option<ContractType>,
) -> ReviewRequest {
    ReviewRequest {
        jurisdiction: jurisdiction.unwrap_or_default(),
        industry: industry.unwrap_or_default(),
        contract_type: contract_type.unwrap_or_default(),
    }
}
