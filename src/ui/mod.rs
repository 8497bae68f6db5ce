// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! User interaction boundary.
//!
//! ```text
//!  FlowContext::confirm/ask ──> Prompt ────> Ui::confirm ──> Choice
//!  FlowContext::dialog ───────> DialogSpec ─> Ui::dialog ──> FormResult
//!  executor (abort / error) ──> Message ───> Ui::show_message ──> action id?
//! ```
//!
//! The executor calls these methods only from the UI context (the task
//! driving the flow). Implementations block until the user answers.

pub mod terminal;

#[cfg(test)]
mod tests;

use bon::Builder;
use std::collections::BTreeMap;

use crate::error::Severity;
use crate::task::helpers::{branch_folder_error, branch_name_error};

pub use terminal::TerminalUi;

/// Answers prompts, dialogs and messages.
pub trait Ui: Send + Sync {
    /// Asks a question and waits for the answer.
    fn confirm(&self, prompt: &Prompt) -> Choice;

    /// Shows a form and waits until it is accepted or cancelled.
    ///
    /// Implementations must not accept a form while a text field fails its
    /// [`TextRule`].
    fn dialog(&self, spec: &DialogSpec) -> FormResult;

    /// Shows a message. Returns the id of the action button pressed, if any.
    fn show_message(&self, message: &Message) -> Option<String>;
}

// --- Prompt / Choice ---

/// Extra checkbox shown under a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkbox {
    pub label: String,
    pub checked: bool,
}

/// Extra button with a custom result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub id: String,
    pub label: String,
}

impl Action {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A yes/no question.
#[derive(Debug, Clone, Builder)]
pub struct Prompt {
    #[builder(into)]
    pub title: String,
    #[builder(into)]
    pub text: String,
    /// Label of the accept button.
    #[builder(into, default = "OK".to_string())]
    pub verb: String,
    #[builder(into, default = "Cancel".to_string())]
    pub cancel_label: String,
    /// Shows the cancel button.
    #[builder(default = true)]
    pub can_cancel: bool,
    #[builder(default = Severity::Information)]
    pub severity: Severity,
    #[builder(default)]
    pub details: Vec<String>,
    pub checkbox: Option<Checkbox>,
    pub action: Option<Action>,
    #[builder(into)]
    pub help: Option<String>,
    /// Key under which the user may suppress this prompt.
    #[builder(into)]
    pub dont_show_again: Option<String>,
}

/// Which button closed a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Accepted,
    Cancelled,
    /// The custom action button, by id.
    Action(String),
}

/// The user's answer to a [`Prompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub answer: Answer,
    /// State of the prompt's checkbox, if it had one.
    pub checked: Option<bool>,
    /// The user ticked "don't show again".
    pub dont_show_again: bool,
}

impl Choice {
    #[must_use]
    pub const fn accept() -> Self {
        Self {
            answer: Answer::Accepted,
            checked: None,
            dont_show_again: false,
        }
    }

    #[must_use]
    pub const fn cancel() -> Self {
        Self {
            answer: Answer::Cancelled,
            checked: None,
            dont_show_again: false,
        }
    }

    pub fn action(id: impl Into<String>) -> Self {
        Self {
            answer: Answer::Action(id.into()),
            checked: None,
            dont_show_again: false,
        }
    }

    /// Accepts with the prompt's defaults (checkbox left as offered).
    #[must_use]
    pub fn accept_defaults(prompt: &Prompt) -> Self {
        Self {
            checked: prompt.checkbox.as_ref().map(|c| c.checked),
            ..Self::accept()
        }
    }

    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    #[must_use]
    pub const fn with_dont_show_again(mut self) -> Self {
        self.dont_show_again = true;
        self
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.answer, Answer::Cancelled)
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.answer, Answer::Accepted)
    }

    #[must_use]
    pub fn is_action(&self, id: &str) -> bool {
        matches!(&self.answer, Answer::Action(a) if a == id)
    }
}

// --- Dialog / FormResult ---

/// Validation applied to a text field before the form may be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TextRule {
    #[default]
    Any,
    NonEmpty,
    /// A valid branch name, not among `reserved`.
    BranchName {
        reserved: Vec<String>,
        taken_message: String,
    },
    /// A new folder for `branches` (currently under `old_folder`), whose
    /// renamed branches must not clash with `reserved`. Empty is allowed.
    BranchFolder {
        old_folder: String,
        branches: Vec<String>,
        reserved: Vec<String>,
    },
}

impl TextRule {
    /// Returns the validation error for `text`, if any.
    #[must_use]
    pub fn check(&self, text: &str) -> Option<String> {
        match self {
            Self::Any => None,
            Self::NonEmpty => text
                .trim()
                .is_empty()
                .then(|| "Cannot be empty.".to_string()),
            Self::BranchName {
                reserved,
                taken_message,
            } => branch_name_error(text, reserved, taken_message),
            Self::BranchFolder {
                old_folder,
                branches,
                reserved,
            } => branch_folder_error(text, old_folder, branches, reserved),
        }
    }
}

/// Input control of a dialog field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text {
        initial: String,
        placeholder: Option<String>,
        rule: TextRule,
    },
    Checkbox {
        checked: bool,
        enabled: bool,
    },
    /// Pick one of `options`.
    Choice {
        options: Vec<String>,
        selected: usize,
    },
    /// Tick any of `options`; `selected` start ticked.
    MultiSelect {
        options: Vec<String>,
        selected: Vec<usize>,
    },
}

/// One dialog field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn text(id: impl Into<String>, label: impl Into<String>, initial: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: FieldKind::Text {
                initial: initial.into(),
                placeholder: None,
                rule: TextRule::Any,
            },
        }
    }

    pub fn checkbox(id: impl Into<String>, label: impl Into<String>, checked: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: FieldKind::Checkbox {
                checked,
                enabled: true,
            },
        }
    }

    pub fn choice(
        id: impl Into<String>,
        label: impl Into<String>,
        options: Vec<String>,
        selected: usize,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: FieldKind::Choice { options, selected },
        }
    }

    pub fn multi_select(id: impl Into<String>, label: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: FieldKind::MultiSelect {
                selected: (0..options.len()).collect(),
                options,
            },
        }
    }

    /// Sets the rule of a text field. No effect on other kinds.
    #[must_use]
    pub fn with_rule(mut self, new_rule: TextRule) -> Self {
        if let FieldKind::Text { rule, .. } = &mut self.kind {
            *rule = new_rule;
        }
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, text: impl Into<String>) -> Self {
        if let FieldKind::Text { placeholder, .. } = &mut self.kind {
            *placeholder = Some(text.into());
        }
        self
    }

    /// Sets which options of a multi-select start ticked.
    #[must_use]
    pub fn with_selection(mut self, indices: Vec<usize>) -> Self {
        if let FieldKind::MultiSelect { selected, .. } = &mut self.kind {
            *selected = indices;
        }
        self
    }

    /// Greys out a checkbox.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        if let FieldKind::Checkbox { enabled, .. } = &mut self.kind {
            *enabled = false;
        }
        self
    }

    /// Value of the field when the user does not touch it.
    #[must_use]
    pub fn default_value(&self) -> FieldValue {
        match &self.kind {
            FieldKind::Text { initial, .. } => FieldValue::Text(initial.clone()),
            FieldKind::Checkbox { checked, .. } => FieldValue::Bool(*checked),
            FieldKind::Choice { selected, .. } => FieldValue::Index(*selected),
            FieldKind::MultiSelect { selected, .. } => FieldValue::Indices(selected.clone()),
        }
    }
}

/// A form collecting structured input.
#[derive(Debug, Clone, Builder)]
pub struct DialogSpec {
    #[builder(into)]
    pub title: String,
    #[builder(into, default)]
    pub text: String,
    #[builder(into)]
    pub subtitle: Option<String>,
    #[builder(default)]
    pub fields: Vec<Field>,
    #[builder(into, default = "OK".to_string())]
    pub accept_label: String,
}

impl DialogSpec {
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// First rule violation in `result`, as `(field label, message)`.
    #[must_use]
    pub fn validate(&self, result: &FormResult) -> Option<(String, String)> {
        self.fields.iter().find_map(|field| {
            let FieldKind::Text { rule, .. } = &field.kind else {
                return None;
            };
            let text = result.text(&field.id).unwrap_or_default();
            rule.check(text).map(|msg| (field.label.clone(), msg))
        })
    }
}

/// Value of one field in a [`FormResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Index(usize),
    Indices(Vec<usize>),
}

/// The user's answer to a [`DialogSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormResult {
    accepted: bool,
    values: BTreeMap<String, FieldValue>,
}

impl FormResult {
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            accepted: false,
            values: BTreeMap::new(),
        }
    }

    /// Accepted with every field at its default value.
    #[must_use]
    pub fn accept_defaults(spec: &DialogSpec) -> Self {
        Self {
            accepted: true,
            values: spec
                .fields
                .iter()
                .map(|f| (f.id.clone(), f.default_value()))
                .collect(),
        }
    }

    /// Overrides one value.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, value: FieldValue) -> Self {
        self.values.insert(id.into(), value);
        self
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.accepted
    }

    #[must_use]
    pub fn text(&self, id: &str) -> Option<&str> {
        match self.values.get(id)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn checked(&self, id: &str) -> Option<bool> {
        match self.values.get(id)? {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn selection(&self, id: &str) -> Option<usize> {
        match self.values.get(id)? {
            FieldValue::Index(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn selections(&self, id: &str) -> Option<&[usize]> {
        match self.values.get(id)? {
            FieldValue::Indices(v) => Some(v),
            _ => None,
        }
    }
}

// --- Message ---

/// An informational, warning or error message.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Message {
    #[builder(into)]
    pub title: String,
    #[builder(into)]
    pub text: String,
    #[builder(default)]
    pub severity: Severity,
    #[builder(default)]
    pub details: Vec<String>,
    #[builder(default)]
    pub actions: Vec<Action>,
}
