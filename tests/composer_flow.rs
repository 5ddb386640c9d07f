mod support;

use pretty_assertions::assert_eq;
use prompt_composer::{
    Attachment, AttachmentKind, ComposerAlert, ComposerError, Key, Modifiers, PickerMode, PromptInputApi,
    SelectionFormat, SendError,
};

use support::{composer, long_text, press, press_with, text, type_text, RecordingSender, Sent};

#[test]
fn mention_selection_replaces_trigger_with_token() {
    let (_, mut composer) = composer();
    type_text(&mut composer, "fix @");

    let picker = composer.snapshot().expect("snapshot").picker.expect("open");
    assert_eq!(picker.mode, PickerMode::Mention);
    assert_eq!(picker.search_query, "");
    assert_eq!(picker.at_position, 4);

    type_text(&mut composer, "src/a");
    press(&mut composer, Key::Enter);

    let snapshot = composer.snapshot().expect("snapshot");
    assert_eq!(snapshot.text, "fix @src/a.ts ");
    assert_eq!(snapshot.cursor, snapshot.text.len());
    assert!(snapshot.picker.is_none());
    assert_eq!(snapshot.attachments.len(), 1);
    assert_eq!(snapshot.attachments[0].kind(), AttachmentKind::File);
    assert_eq!(snapshot.attachments[0].path(), Some("src/a.ts"));
}

#[test]
fn large_pastes_get_increasing_placeholders() {
    let (_, mut composer) = composer();
    let block = long_text(8);

    composer.paste_text(&block).expect("paste");
    assert_eq!(text(&composer), "[pasted #1]");

    type_text(&mut composer, " ");
    composer.paste_text(&block).expect("paste");
    assert_eq!(text(&composer), "[pasted #1] [pasted #2]");

    let labels: Vec<String> = composer
        .attachments()
        .expect("attachments")
        .into_iter()
        .map(|attachment| attachment.display)
        .collect();
    assert_eq!(labels, vec!["pasted #1 (8 lines)", "pasted #2 (8 lines)"]);
}

#[test]
fn long_single_line_paste_counts_one_line() {
    let (_, mut composer) = composer();
    composer.paste_text(&"x".repeat(200)).expect("paste");
    let attachments = composer.attachments().expect("attachments");
    assert_eq!(attachments[0].display, "pasted #1 (1 line)");
}

#[test]
fn short_paste_is_inserted_literally() {
    let (_, mut composer) = composer();
    composer.paste_text("two\r\nlines").expect("paste");
    assert_eq!(text(&composer), "two\nlines");
    assert!(composer.attachments().expect("attachments").is_empty());
}

#[test]
fn backspace_after_placeholder_removes_token_and_attachment() {
    let (_, mut composer) = composer();
    composer.paste_text(&long_text(6)).expect("paste");
    type_text(&mut composer, " hello");
    assert_eq!(text(&composer), "[pasted #1] hello");

    composer.set_selection(11, 11).expect("cursor");
    press(&mut composer, Key::Backspace);

    let snapshot = composer.snapshot().expect("snapshot");
    assert_eq!(snapshot.text, " hello");
    assert_eq!(snapshot.cursor, 0);
    assert!(snapshot.attachments.is_empty());
}

#[test]
fn placeholder_pasted_after_a_word_gets_its_own_token() {
    let (_, mut composer) = composer();
    let body = "é".repeat(200);
    composer.set_prompt("@a/").expect("set");
    composer.paste_text(&body).expect("paste");
    assert_eq!(text(&composer), "@a/ [pasted #1]");

    composer
        .paste_image(vec![1], "image/png", None)
        .expect("paste");
    assert_eq!(text(&composer), "@a/ [pasted #1] [Image #1]");

    let mut sender = RecordingSender::default();
    composer.submit_with(&mut sender).expect("sent");
    let Sent::Prompt { text, attachments } = &sender.sent[0] else {
        panic!("expected prompt, got {:?}", sender.sent);
    };
    assert_eq!(text, &format!("a/ {body} [Image #1]"));
    assert_eq!(attachments.len(), 1);
}

#[test]
fn counters_stay_monotonic_after_removal() {
    let (_, mut composer) = composer();
    composer.paste_text(&long_text(6)).expect("paste");
    press(&mut composer, Key::Backspace);
    assert_eq!(text(&composer), "");

    composer.paste_text(&long_text(6)).expect("paste");
    assert_eq!(text(&composer), "[pasted #2]");
}

#[test]
fn editing_inside_a_token_drops_its_attachment() {
    let (_, mut composer) = composer();
    composer
        .set_prompt_text("[pasted #1] hi", vec![Attachment::pasted_text(1, "body")])
        .expect("restore");
    assert_eq!(composer.attachments().expect("attachments").len(), 1);

    composer.set_selection(1, 7).expect("select");
    type_text(&mut composer, "x");
    assert_eq!(text(&composer), "[x #1] hi");
    assert!(composer.attachments().expect("attachments").is_empty());
}

#[test]
fn unknown_slash_command_is_sent_as_text() {
    let (_, mut composer) = composer();
    composer.set_prompt("/rev").expect("set");
    let picker = composer.snapshot().expect("snapshot").picker.expect("open");
    assert_eq!(picker.mode, PickerMode::Command);
    assert_eq!(picker.search_query, "rev");

    let mut sender = RecordingSender::default();
    composer.submit_with(&mut sender).expect("sent");
    assert_eq!(
        sender.sent,
        vec![Sent::Prompt {
            text: "/rev".to_string(),
            attachments: Vec::new(),
        }]
    );
    assert_eq!(text(&composer), "");
}

#[test]
fn known_slash_command_keeps_attachments() {
    let (_, mut composer) = composer();
    let block = long_text(6);
    composer.paste_text(&block).expect("paste");
    composer.set_selection(0, 0).expect("cursor");
    composer.insert_text("/review ").expect("insert");

    let mut sender = RecordingSender::default();
    composer.submit_with(&mut sender).expect("sent");
    assert_eq!(
        sender.sent,
        vec![Sent::Command {
            name: "review".to_string(),
            arguments: block,
        }]
    );

    let snapshot = composer.snapshot().expect("snapshot");
    assert_eq!(snapshot.text, "[pasted #1] ");
    assert_eq!(snapshot.attachments.len(), 1);
}

#[test]
fn plain_text_confirm_sends_path_without_at() {
    let (_, mut composer) = composer();
    type_text(&mut composer, "see @src/a");
    press_with(&mut composer, Key::Tab, Modifiers::SHIFT);

    assert_eq!(text(&composer), "see @src/a.ts ");
    assert!(composer.attachments().expect("attachments").is_empty());

    let mut sender = RecordingSender::default();
    composer.submit_with(&mut sender).expect("sent");
    assert_eq!(
        sender.sent,
        vec![Sent::Prompt {
            text: "see src/a.ts".to_string(),
            attachments: Vec::new(),
        }]
    );
}

#[test]
fn prompt_send_inlines_pastes_and_carries_files() {
    let (_, mut composer) = composer();
    composer.paste_text(&long_text(5)).expect("paste");
    type_text(&mut composer, " about @src/a");
    press(&mut composer, Key::Enter);
    press(&mut composer, Key::Backspace);
    assert_eq!(text(&composer), "[pasted #1] about @src/a.ts");

    let mut sender = RecordingSender::default();
    composer.submit_with(&mut sender).expect("sent");
    let Sent::Prompt { text, attachments } = &sender.sent[0] else {
        panic!("expected prompt, got {:?}", sender.sent);
    };
    assert_eq!(text, &format!("{} about @src/a.ts", long_text(5)));
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].path(), Some("src/a.ts"));
    assert!(composer.attachments().expect("attachments").is_empty());
}

#[test]
fn send_failure_raises_alert_and_keeps_prompt_cleared() {
    let (_, mut composer) = composer();
    composer.set_prompt("hello").expect("set");

    let ticket = composer.begin_submit().expect("ticket");
    let snapshot = composer.snapshot().expect("snapshot");
    assert!(snapshot.is_sending);
    assert!(!snapshot.can_send);
    assert_eq!(snapshot.text, "");

    type_text(&mut composer, "next");
    assert!(!composer.snapshot().expect("snapshot").can_send);
    assert!(matches!(
        composer.begin_submit(),
        Err(ComposerError::SendInFlight)
    ));

    let result = composer.complete_submit(&ticket.session, Err(SendError::new("network down")));
    assert!(matches!(result, Err(ComposerError::Send(_))));

    let snapshot = composer.snapshot().expect("snapshot");
    assert!(!snapshot.is_sending);
    assert!(snapshot.can_send);
    assert_eq!(snapshot.text, "next");
    assert_eq!(
        snapshot.alert,
        Some(ComposerAlert {
            title: "Failed to send prompt".to_string(),
            detail: "network down".to_string(),
        })
    );

    composer.dismiss_alert().expect("dismiss");
    assert!(composer.snapshot().expect("snapshot").alert.is_none());
}

#[test]
fn empty_prompt_cannot_be_submitted() {
    let (_, mut composer) = composer();
    type_text(&mut composer, "   ");
    assert!(!composer.snapshot().expect("snapshot").can_send);
    assert!(matches!(
        composer.begin_submit(),
        Err(ComposerError::EmptyPrompt)
    ));
}

#[test]
fn insert_selection_formats_quote_and_code() {
    let (_, mut composer) = composer();
    composer.set_prompt("see").expect("set");
    composer
        .insert_selection("a\n\nb", SelectionFormat::Quote)
        .expect("quote");
    assert_eq!(text(&composer), "see\n> a\n>\n> b\n");

    composer.clear_prompt().expect("clear");
    composer
        .insert_selection("let x = 1;\n", SelectionFormat::Code)
        .expect("code");
    assert_eq!(text(&composer), "```\nlet x = 1;\n```\n");
}

#[test]
fn expand_text_attachment_restores_pasted_text() {
    let (_, mut composer) = composer();
    let block = long_text(6);
    type_text(&mut composer, "look: ");
    composer.paste_text(&block).expect("paste");
    let id = composer.attachments().expect("attachments")[0].id.clone();

    composer.expand_text_attachment(&id).expect("expand");
    assert_eq!(text(&composer), format!("look: {block}"));
    assert!(composer.attachments().expect("attachments").is_empty());

    assert!(matches!(
        composer.expand_text_attachment(&id),
        Err(ComposerError::UnknownAttachment(_))
    ));
}

#[test]
fn expand_rejects_non_text_attachments() {
    let (_, mut composer) = composer();
    composer.drop_files(&["src/a.ts"]).expect("drop");
    let id = composer.attachments().expect("attachments")[0].id.clone();
    assert!(matches!(
        composer.expand_text_attachment(&id),
        Err(ComposerError::NotTextAttachment(_))
    ));
}

#[test]
fn dropped_files_become_mentions_and_images() {
    let (_, mut composer) = composer();
    composer.set_prompt("look").expect("set");
    composer
        .drop_files(&["src/main.rs", "shot.png", "has space.txt"])
        .expect("drop");

    assert_eq!(text(&composer), "look @src/main.rs [Image #1]");
    let attachments = composer.attachments().expect("attachments");
    assert_eq!(attachments.len(), 2);
    assert_eq!(attachments[0].path(), Some("src/main.rs"));
    assert!(attachments[1].is_image());
    assert_eq!(attachments[1].display, "Image #1");
}

#[test]
fn pasted_image_deletes_atomically() {
    let (_, mut composer) = composer();
    let id = composer
        .paste_image(vec![0x89, 0x50], "image/png", None)
        .expect("paste");
    assert_eq!(text(&composer), "[Image #1]");
    let attachments = composer.attachments().expect("attachments");
    assert_eq!(attachments[0].id, id);
    assert_eq!(attachments[0].filename, "image-1.png");

    press(&mut composer, Key::Backspace);
    assert_eq!(text(&composer), "");
    assert!(composer.attachments().expect("attachments").is_empty());
}

#[test]
fn remove_attachment_strips_its_placeholder() {
    let (_, mut composer) = composer();
    composer.paste_text(&long_text(6)).expect("paste");
    type_text(&mut composer, " tail");
    let id = composer.attachments().expect("attachments")[0].id.clone();

    let removed = composer.remove_attachment(&id).expect("removed");
    assert_eq!(removed.counter(), Some(1));
    assert_eq!(text(&composer), " tail");
}

#[test]
fn focus_is_tracked() {
    let (_, mut composer) = composer();
    assert!(!composer.snapshot().expect("snapshot").focused);
    composer.focus().expect("focus");
    assert!(composer.snapshot().expect("snapshot").focused);
    composer.blur().expect("blur");
    assert!(!composer.snapshot().expect("snapshot").focused);
}
