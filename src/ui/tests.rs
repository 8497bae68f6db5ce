// repotask: Resumable Git Task Flows
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{BufReader, Cursor, Read, Write};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{
    Action, Answer, Checkbox, Choice, DialogSpec, Field, FieldValue, FormResult, Message, Prompt,
    TerminalUi, TextRule, Ui,
};
use crate::error::Severity;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn terminal(input: &str) -> TerminalUi {
    TerminalUi::new(Cursor::new(input.to_string()), std::io::sink(), false)
}

fn prompt() -> Prompt {
    Prompt::builder()
        .title("Switch")
        .text("Do you want to switch to branch 'dev'?")
        .verb("Switch")
        .build()
}

#[test]
fn prompt_defaults() {
    let p = prompt();
    assert!(p.can_cancel);
    assert_eq!(p.cancel_label, "Cancel");
    assert_eq!(p.severity, Severity::Information);
    assert!(p.checkbox.is_none());
    assert!(p.dont_show_again.is_none());
}

#[test]
fn choice_helpers() {
    assert!(Choice::accept().is_accepted());
    assert!(Choice::cancel().is_cancelled());
    assert!(Choice::action("merge").is_action("merge"));
    assert!(!Choice::action("merge").is_action("other"));

    let p = Prompt::builder()
        .title("t")
        .text("x")
        .checkbox(Checkbox {
            label: "Delete".to_string(),
            checked: true,
        })
        .build();
    assert_eq!(Choice::accept_defaults(&p).checked, Some(true));
}

#[test]
fn text_rules() {
    assert_eq!(TextRule::Any.check(""), None);
    assert!(TextRule::NonEmpty.check("  ").is_some());
    let rule = TextRule::BranchName {
        reserved: vec!["main".to_string()],
        taken_message: "taken".to_string(),
    };
    assert_eq!(rule.check("main").as_deref(), Some("taken"));
    assert_eq!(rule.check("dev"), None);
}

#[test]
fn form_defaults_and_overrides() {
    let spec = DialogSpec::builder()
        .title("New branch")
        .fields(vec![
            Field::text("name", "Name", "dev"),
            Field::checkbox("switch", "Switch to branch", true).disabled(),
            Field::choice("mode", "Mode", vec!["soft".into(), "mixed".into()], 1),
            Field::multi_select("files", "Files", vec!["a".into(), "b".into()]),
        ])
        .build();

    let result = FormResult::accept_defaults(&spec);
    assert!(result.is_accepted());
    assert_eq!(result.text("name"), Some("dev"));
    assert_eq!(result.checked("switch"), Some(true));
    assert_eq!(result.selection("mode"), Some(1));
    assert_eq!(result.selections("files"), Some(&[0, 1][..]));
    assert_eq!(result.text("switch"), None);

    let result = result.with("name", FieldValue::Text("other".into()));
    assert_eq!(result.text("name"), Some("other"));
    assert!(!FormResult::cancelled().is_accepted());
}

#[test]
fn dialog_validation_reports_field() {
    let spec = DialogSpec::builder()
        .title("Rename")
        .fields(vec![Field::text("name", "New name", "old").with_rule(
            TextRule::BranchName {
                reserved: vec!["taken".to_string()],
                taken_message: "This name is already taken.".to_string(),
            },
        )])
        .build();

    let ok = FormResult::accept_defaults(&spec);
    assert_eq!(spec.validate(&ok), None);

    let bad = ok.with("name", FieldValue::Text("taken".into()));
    assert_eq!(
        spec.validate(&bad),
        Some((
            "New name".to_string(),
            "This name is already taken.".to_string()
        ))
    );
}

#[test]
fn terminal_confirm_answers() {
    assert!(terminal("y\n").confirm(&prompt()).is_accepted());
    assert!(terminal("\n").confirm(&prompt()).is_accepted());
    assert!(terminal("n\n").confirm(&prompt()).is_cancelled());
    assert!(terminal("").confirm(&prompt()).is_cancelled());
    assert!(terminal("what\ny\n").confirm(&prompt()).is_accepted());
}

#[test]
fn terminal_confirm_action_and_dont_show_again() {
    let p = Prompt::builder()
        .title("Fast-forwarding possible")
        .text("Your branch can be fast-forwarded.")
        .action(Action::new("merge-commit", "Create Merge Commit"))
        .dont_show_again("Key")
        .build();

    assert_eq!(
        terminal("a\n").confirm(&p).answer,
        Answer::Action("merge-commit".to_string())
    );
    let choice = terminal("d\n").confirm(&p);
    assert!(choice.is_accepted());
    assert!(choice.dont_show_again);
}

#[test]
fn terminal_confirm_without_cancel_accepts_on_eof() {
    let p = Prompt::builder().title("t").text("x").can_cancel(false).build();
    assert!(terminal("").confirm(&p).is_accepted());
    // 'n' is not an option, so the answer is asked again until EOF.
    assert!(terminal("n\n").confirm(&p).is_accepted());
}

#[test]
fn terminal_confirm_checkbox() {
    let p = Prompt::builder()
        .title("Apply stash")
        .text("Apply?")
        .checkbox(Checkbox {
            label: "Delete the stash if it applies cleanly".to_string(),
            checked: true,
        })
        .build();
    assert_eq!(terminal("y\n\n").confirm(&p).checked, Some(true));
    assert_eq!(terminal("y\nn\n").confirm(&p).checked, Some(false));
}

#[test]
fn terminal_dialog_reprompts_invalid_text() {
    let out = SharedBuffer::default();
    let ui = TerminalUi::new(Cursor::new("taken\nfresh\ny\n"), out.clone(), false);
    let spec = DialogSpec::builder()
        .title("Rename local branch")
        .fields(vec![Field::text("name", "New name", "old").with_rule(
            TextRule::BranchName {
                reserved: vec!["taken".to_string()],
                taken_message: "This name is already taken by another local branch.".to_string(),
            },
        )])
        .build();

    let result = ui.dialog(&spec);
    assert!(result.is_accepted());
    assert_eq!(result.text("name"), Some("fresh"));
    assert!(
        out.contents()
            .contains("This name is already taken by another local branch.")
    );
}

#[test]
fn terminal_dialog_fields() {
    let spec = DialogSpec::builder()
        .title("Stash")
        .fields(vec![
            Field::text("message", "Message", ""),
            Field::multi_select("files", "Files", vec!["a".into(), "b".into(), "c".into()]),
            Field::checkbox("keep", "Keep intact", false),
            Field::choice("mode", "Mode", vec!["soft".into(), "hard".into()], 0),
        ])
        .build();

    let result = terminal("wip\n1, 3\ny\n2\n\n").dialog(&spec);
    assert!(result.is_accepted());
    assert_eq!(result.text("message"), Some("wip"));
    assert_eq!(result.selections("files"), Some(&[0, 2][..]));
    assert_eq!(result.checked("keep"), Some(true));
    assert_eq!(result.selection("mode"), Some(1));

    assert!(!terminal("wip\n").dialog(&spec).is_accepted());
    assert!(!terminal("\n\n\n\nn\n").dialog(&spec).is_accepted());
}

#[test]
fn terminal_assume_yes() {
    let ui = TerminalUi::new(Cursor::new(String::new()), std::io::sink(), true);
    assert!(ui.confirm(&prompt()).is_accepted());

    let spec = DialogSpec::builder()
        .title("t")
        .fields(vec![Field::text("name", "Name", "x")])
        .build();
    assert_eq!(ui.dialog(&spec).text("name"), Some("x"));
}

#[test]
fn terminal_message_actions() {
    let message = Message::builder()
        .title("Fast-forward")
        .text("The branches are divergent.")
        .actions(vec![Action::new("merge", "Merge into 'main'")])
        .build();
    assert_eq!(terminal("1\n").show_message(&message), Some("merge".to_string()));
    assert_eq!(terminal("\n").show_message(&message), None);
    assert_eq!(terminal("7\n").show_message(&message), None);

    let out = SharedBuffer::default();
    let ui = TerminalUi::new(Cursor::new(String::new()), out.clone(), false);
    let plain = Message::builder()
        .title("Delete branch")
        .text("Cannot delete 'main' because it is the current branch.")
        .build();
    assert_eq!(ui.show_message(&plain), None);
    insta::assert_snapshot!(out.contents().trim(), @r"
    [warning] Delete branch
    Cannot delete 'main' because it is the current branch.
    ");
}

/// Input that never produces a line until its sender goes away.
struct SilentInput(mpsc::Receiver<()>);

impl Read for SilentInput {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        let _ = self.0.recv();
        Ok(0)
    }
}

#[test]
fn cancel_token_ends_a_waiting_prompt() {
    let (_keep_open, never) = mpsc::channel();
    let token = CancellationToken::new();
    let ui = TerminalUi::new(BufReader::new(SilentInput(never)), std::io::sink(), false)
        .with_cancel_token(token.clone());
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        token.cancel();
    });

    // A prompt without a cancel button still reports the interruption.
    let p = Prompt::builder().title("t").text("x").can_cancel(false).build();
    assert!(ui.confirm(&p).is_cancelled());
    assert!(!ui.dialog(&DialogSpec::builder().title("t").build()).is_accepted());
    canceller.join().unwrap();
}
