// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Line-oriented [`Ui`] for the command line.
//!
//! Prompts go to stderr so that `--json` output on stdout stays clean.
//! With `assume_yes` every prompt and form is accepted with its defaults.
//! End of input cancels, and so does the cancellation token.
//!
//! ```text
//! input thread: read_line() --sync_channel(0)--> read_line() on the caller
//!                                                (polls the cancel token)
//! ```

use std::io::{self, BufRead, BufReader, Write};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, sync_channel};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{Choice, DialogSpec, FieldKind, FieldValue, FormResult, Message, Prompt, Ui};
use crate::error::Severity;

/// How often a waiting prompt checks for cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(100);

pub struct TerminalUi {
    /// Taken by the input thread on the first read.
    input: Mutex<Option<Box<dyn BufRead + Send>>>,
    lines: OnceLock<Mutex<Receiver<String>>>,
    output: Mutex<Box<dyn Write + Send>>,
    assume_yes: bool,
    cancel_token: Option<CancellationToken>,
}

impl TerminalUi {
    /// Reads answers from stdin and writes prompts to stderr.
    #[must_use]
    pub fn stdio(assume_yes: bool) -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr(), assume_yes)
    }

    pub fn new(
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
        assume_yes: bool,
    ) -> Self {
        Self {
            input: Mutex::new(Some(Box::new(input))),
            lines: OnceLock::new(),
            output: Mutex::new(Box::new(output)),
            assume_yes,
            cancel_token: None,
        }
    }

    /// Pending and future prompts give up once `token` is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn say(&self, text: &str) {
        if let Ok(mut out) = self.output.lock() {
            // Write errors are ignored.
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }

    /// Lines from the input thread, started on first use.
    fn lines(&self) -> Option<&Mutex<Receiver<String>>> {
        if let Some(lines) = self.lines.get() {
            return Some(lines);
        }
        let input = self.input.lock().ok()?.take()?;
        let (sender, receiver) = sync_channel(0);
        if let Err(e) = thread::Builder::new()
            .name("repotask-input".to_string())
            .spawn(move || forward_lines(input, &sender))
        {
            warn!(error = %e, "cannot start input reader");
            return None;
        }
        Some(self.lines.get_or_init(|| Mutex::new(receiver)))
    }

    /// Next trimmed input line. `None` at end of input or once cancelled.
    fn read_line(&self) -> Option<String> {
        let lines = self.lines()?.lock().ok()?;
        loop {
            if self.is_cancelled() {
                return None;
            }
            match lines.recv_timeout(CANCEL_POLL) {
                Ok(line) => return Some(line.trim().to_string()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn ask_line(&self, question: &str) -> Option<String> {
        self.say(question);
        self.read_line()
    }

    /// Yes/no question; empty input picks `default`.
    fn ask_yes_no(&self, question: &str, default: bool) -> Option<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask_line(&format!("{question} {hint} "))?;
            match answer.to_ascii_lowercase().as_str() {
                "" => return Some(default),
                "y" | "yes" => return Some(true),
                "n" | "no" => return Some(false),
                _ => self.say("Please answer y or n.\n"),
            }
        }
    }

    fn header(&self, title: &str, severity: Severity) {
        let tag = match severity {
            Severity::Information => "",
            Severity::Warning => "[warning] ",
            Severity::Critical => "[error] ",
        };
        self.say(&format!("\n{tag}{title}\n"));
    }

    fn details(&self, details: &[String]) {
        for line in details {
            self.say(&format!("    {line}\n"));
        }
    }

    fn read_field(&self, kind: &FieldKind, label: &str) -> Option<FieldValue> {
        match kind {
            FieldKind::Text { initial, rule, .. } => loop {
                let answer = self.ask_line(&format!("{label} [{initial}]: "))?;
                let text = if answer.is_empty() {
                    initial.clone()
                } else {
                    answer
                };
                match rule.check(&text) {
                    Some(problem) => self.say(&format!("{problem}\n")),
                    None => return Some(FieldValue::Text(text)),
                }
            },
            FieldKind::Checkbox { checked, enabled } => {
                if *enabled {
                    self.ask_yes_no(label, *checked).map(FieldValue::Bool)
                } else {
                    Some(FieldValue::Bool(*checked))
                }
            }
            FieldKind::Choice { options, selected } => {
                for (i, option) in options.iter().enumerate() {
                    self.say(&format!("  {}) {option}\n", i + 1));
                }
                loop {
                    let answer = self.ask_line(&format!("{label} [{}]: ", selected + 1))?;
                    if answer.is_empty() {
                        return Some(FieldValue::Index(*selected));
                    }
                    match answer.parse::<usize>() {
                        Ok(n) if (1..=options.len()).contains(&n) => {
                            return Some(FieldValue::Index(n - 1));
                        }
                        _ => self.say("Not a valid option.\n"),
                    }
                }
            }
            FieldKind::MultiSelect { options, selected } => {
                for (i, option) in options.iter().enumerate() {
                    let mark = if selected.contains(&i) { 'x' } else { ' ' };
                    self.say(&format!("  [{mark}] {}) {option}\n", i + 1));
                }
                loop {
                    let answer = self.ask_line(&format!("{label} [ticked]: "))?;
                    if answer.is_empty() {
                        return Some(FieldValue::Indices(selected.clone()));
                    }
                    let picked: Option<Vec<usize>> = answer
                        .split([',', ' '])
                        .filter(|s| !s.is_empty())
                        .map(|s| match s.parse::<usize>() {
                            Ok(n) if (1..=options.len()).contains(&n) => Some(n - 1),
                            _ => None,
                        })
                        .collect();
                    match picked {
                        Some(indices) if !indices.is_empty() => {
                            return Some(FieldValue::Indices(indices));
                        }
                        _ => self.say("Enter option numbers separated by commas.\n"),
                    }
                }
            }
        }
    }
}

impl Ui for TerminalUi {
    fn confirm(&self, prompt: &Prompt) -> Choice {
        self.header(&prompt.title, prompt.severity);
        self.say(&format!("{}\n", prompt.text));
        self.details(&prompt.details);
        if let Some(help) = &prompt.help {
            self.say(&format!("{help}\n"));
        }

        if self.assume_yes {
            tracing::debug!(title = %prompt.title, "auto-accepting prompt");
            return Choice::accept_defaults(prompt);
        }

        let mut options = vec![format!("[y] {}", prompt.verb)];
        if let Some(action) = &prompt.action {
            options.push(format!("[a] {}", action.label));
        }
        if prompt.dont_show_again.is_some() {
            options.push(format!("[d] {} and don't ask again", prompt.verb));
        }
        if prompt.can_cancel {
            options.push(format!("[n] {}", prompt.cancel_label));
        }
        let question = format!("{} ", options.join("  "));

        let mut choice = loop {
            let Some(answer) = self.ask_line(&question) else {
                return if prompt.can_cancel || self.is_cancelled() {
                    Choice::cancel()
                } else {
                    Choice::accept_defaults(prompt)
                };
            };
            match answer.to_ascii_lowercase().as_str() {
                "" | "y" | "yes" => break Choice::accept(),
                "d" if prompt.dont_show_again.is_some() => {
                    break Choice::accept().with_dont_show_again();
                }
                "a" => {
                    if let Some(action) = &prompt.action {
                        break Choice::action(action.id.clone());
                    }
                }
                "n" | "no" if prompt.can_cancel => return Choice::cancel(),
                _ => {}
            }
            self.say("Please pick one of the options.\n");
        };

        if let Some(checkbox) = &prompt.checkbox {
            match self.ask_yes_no(&checkbox.label, checkbox.checked) {
                Some(checked) => choice = choice.with_checked(checked),
                None => return Choice::cancel(),
            }
        }
        choice
    }

    fn dialog(&self, spec: &DialogSpec) -> FormResult {
        self.header(&spec.title, Severity::Information);
        if let Some(subtitle) = &spec.subtitle {
            self.say(&format!("{subtitle}\n"));
        }
        if !spec.text.is_empty() {
            self.say(&format!("{}\n", spec.text));
        }

        if self.assume_yes {
            tracing::debug!(title = %spec.title, "auto-accepting dialog");
            return FormResult::accept_defaults(spec);
        }

        let mut result = FormResult::accept_defaults(spec);
        for field in &spec.fields {
            match self.read_field(&field.kind, &field.label) {
                Some(value) => result = result.with(field.id.clone(), value),
                None => return FormResult::cancelled(),
            }
        }

        match self.ask_yes_no(&format!("{}?", spec.accept_label), true) {
            Some(true) => result,
            _ => FormResult::cancelled(),
        }
    }

    fn show_message(&self, message: &Message) -> Option<String> {
        self.header(&message.title, message.severity);
        self.say(&format!("{}\n", message.text));
        self.details(&message.details);

        if message.actions.is_empty() || self.assume_yes {
            return None;
        }
        for (i, action) in message.actions.iter().enumerate() {
            self.say(&format!("  {}) {}\n", i + 1, action.label));
        }
        let answer = self.ask_line("Pick an action, or press Enter to close: ")?;
        let n = answer.parse::<usize>().ok()?;
        message
            .actions
            .get(n.checked_sub(1)?)
            .map(|a| a.id.clone())
    }
}

/// Sends input lines until end of input or until nobody listens.
fn forward_lines(mut input: Box<dyn BufRead + Send>, lines: &SyncSender<String>) {
    loop {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if lines.send(line).is_err() {
                    break;
                }
            }
        }
    }
}
