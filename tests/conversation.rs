mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{reply, CountingStore, FailingStore, ScriptedProvider, ScriptedTransport};
use intake::api::models::{ChatReply, Role};
use intake::client::capture::{capture_answer, extract_contact, Contact};
use intake::client::detect::{detect_question, Widget};
use intake::client::options::{OptionSelector, ALL_DAYS, WEEKDAYS};
use intake::client::split::AnchorTable;
use intake::client::transcript::{Author, Directive};
use intake::client::transport::TransportError;
use intake::client::{ChatClient, ClientError, Focus, APOLOGY};
use intake::config::{FlowConfig, PersistencePolicy, QuestionTag};
use intake::db::models::Field;
use intake::db::ApplicationStore;
use intake::relay::Relay;

fn intake_flow() -> Arc<FlowConfig> {
    Arc::new(FlowConfig::intake())
}

// --- Splitting ---

#[test]
fn every_configured_anchor_splits_into_two_entries() {
    let flow = FlowConfig::intake();
    let table = AnchorTable::new(flow.split_anchors.clone());

    for anchor in &flow.split_anchors {
        let original = format!("Great, thank you. {} and a bit more.", anchor);
        let parts = table.split(&original);
        assert_eq!(parts.len(), 2, "anchor {:?}", anchor);
        assert_eq!(parts[0], "Great, thank you.");
        assert!(parts[1].starts_with(anchor.as_str()));
        assert_eq!(parts.join(" "), original);
    }
}

#[test]
fn reply_without_anchor_stays_whole() {
    let table = AnchorTable::new(FlowConfig::intake().split_anchors);
    assert_eq!(table.split("  What's your name?  "), vec!["What's your name?"]);
    // An anchor with nothing in front of it does not split either
    assert_eq!(
        table.split("Complete this sentence: I want to join because..."),
        vec!["Complete this sentence: I want to join because..."]
    );
}

// --- Detection ---

#[test]
fn detection_follows_anchor_phrases() {
    let flow = FlowConfig::intake();

    let name = detect_question(&flow, "Hi! What's your name?", None);
    assert_eq!(name.tag, QuestionTag::Name);
    assert_eq!(name.widget, Widget::Text { prefill: None });

    let linkedin = detect_question(&flow, "Nice to meet you, Jack! Could you share your LinkedIn profile?", None);
    assert_eq!(linkedin.tag, QuestionTag::Linkedin);
    assert_eq!(
        linkedin.widget,
        Widget::Text {
            prefill: Some("https://www.linkedin.com/in/".to_string())
        }
    );

    let days = detect_question(&flow, "Which days of the week are you available?", None);
    assert_eq!(days.tag, QuestionTag::AvailableDays);
    assert_eq!(days.widget, Widget::DaySelector);

    let time = detect_question(&flow, "Lovely. What time of day works best for you?", None);
    assert_eq!(time.tag, QuestionTag::PreferredTime);
    assert_eq!(time.widget, Widget::TimeSelector);

    let contact = detect_question(&flow, "Please share your email or phone number.", None);
    assert_eq!(contact.tag, QuestionTag::Contact);

    let other = detect_question(&flow, "Tell me anything else.", None);
    assert_eq!(other.tag, QuestionTag::FreeForm);
}

#[test]
fn contact_phrase_yields_to_the_next_question() {
    let flow = FlowConfig::intake();

    let days = detect_question(
        &flow,
        "Got your email or phone. Which days of the week are you available?",
        None,
    );
    assert_eq!(days.tag, QuestionTag::AvailableDays);
    assert_eq!(days.widget, Widget::DaySelector);

    let motivation = detect_question(
        &flow,
        "Thanks, your email or phone is noted. Complete this sentence: \"I want to join because...\"",
        None,
    );
    assert_eq!(motivation.tag, QuestionTag::Motivation);

    let time = detect_question(&flow, "Saved your email or phone. What time of day suits you?", None);
    assert_eq!(time.tag, QuestionTag::PreferredTime);
}

#[test]
fn detection_order_puts_contact_last_by_default() {
    let flow = FlowConfig::bootcamp();
    let order: Vec<QuestionTag> = flow.detection_order().iter().map(|q| q.tag).collect();
    assert_eq!(order.len(), flow.questions.len());
    assert_eq!(order.first(), Some(&QuestionTag::Age));
    assert_eq!(order.last(), Some(&QuestionTag::Email));

    let detection = detect_question(
        &flow,
        "Thanks for your email address! Can you share your LinkedIn profile? (optional)",
        None,
    );
    assert_eq!(detection.tag, QuestionTag::Linkedin);

    let intake: Vec<QuestionTag> = FlowConfig::intake().detection_order().iter().map(|q| q.tag).collect();
    assert_eq!(
        intake,
        vec![
            QuestionTag::Name,
            QuestionTag::Motivation,
            QuestionTag::Linkedin,
            QuestionTag::AvailableDays,
            QuestionTag::PreferredTime,
            QuestionTag::Contact
        ]
    );
}

#[test]
fn explicit_tag_beats_anchor_text() {
    let flow = FlowConfig::intake();
    let detection = detect_question(&flow, "What's your name?", Some(QuestionTag::PreferredTime));
    assert_eq!(detection.tag, QuestionTag::PreferredTime);
    assert_eq!(detection.widget, Widget::TimeSelector);

    // A tag the flow does not ask falls back to free text
    let detection = detect_question(&flow, "What's your name?", Some(QuestionTag::Age));
    assert_eq!(detection.tag, QuestionTag::FreeForm);
}

// --- Capture ---

#[test]
fn contact_capture_prefers_email() {
    assert_eq!(
        extract_contact("mail me at ann@example.com or call 555 123 4567"),
        Contact::Email("ann@example.com".to_string())
    );
    assert_eq!(
        extract_contact("call me on +34 612 345 678 please"),
        Contact::Phone("+34 612 345 678".to_string())
    );
    assert_eq!(extract_contact("carrier pigeon"), Contact::Phone("carrier pigeon".to_string()));

    let email_only = capture_answer(QuestionTag::Contact, "ann@example.com");
    assert_eq!(email_only.get(&Field::Email).map(String::as_str), Some("ann@example.com"));
    assert!(!email_only.contains_key(&Field::Phone));
}

#[test]
fn simple_answers_are_stored_trimmed() {
    let fields = capture_answer(QuestionTag::Motivation, "  I love building things  ");
    assert_eq!(fields.get(&Field::Motivation).map(String::as_str), Some("I love building things"));
    assert!(capture_answer(QuestionTag::FreeForm, "hello").is_empty());
}

// --- Selectors ---

#[test]
fn seven_days_equal_all_days() {
    let mut by_hand = OptionSelector::days();
    for day in WEEKDAYS {
        by_hand.set(day, true);
    }
    let mut by_meta = OptionSelector::days();
    by_meta.set(ALL_DAYS, true);

    assert!(by_hand.is_checked(ALL_DAYS));
    assert_eq!(by_hand.answer(), by_meta.answer());
    assert!(!by_meta.answer().unwrap().contains(ALL_DAYS));
}

#[test]
fn dropping_one_day_clears_the_meta_option() {
    let mut selector = OptionSelector::days();
    selector.set(ALL_DAYS, true);
    assert_eq!(selector.toggle("Wednesday"), Some(false));

    assert!(!selector.is_checked(ALL_DAYS));
    assert_eq!(selector.selected().len(), 6);
    assert_eq!(
        selector.answer().unwrap(),
        "Monday, Tuesday, Thursday, Friday, Saturday, Sunday"
    );

    selector.set(ALL_DAYS, false);
    assert!(selector.answer().is_none());
}

#[test]
fn time_slots_have_no_meta_option() {
    let mut selector = OptionSelector::times();
    assert!(!selector.set(ALL_DAYS, true));
    assert_eq!(selector.labels(), vec!["Morning", "Afternoon", "Evening"]);
    selector.set("Evening", true);
    selector.set("Morning", true);
    assert_eq!(selector.answer().unwrap(), "Morning, Evening");
}

// --- Client turn loop ---

#[tokio::test]
async fn name_then_linkedin_prefills_input() {
    let transport = ScriptedTransport::texts(&[
        "Hi there! What's your name?",
        "Nice to meet you, Jack! Could you share your LinkedIn profile?",
    ]);
    let mut client = ChatClient::new(intake_flow(), transport);

    let opening = client.start().await;
    assert_eq!(opening.texts(), vec!["Hi there! What's your name?"]);
    assert_eq!(client.state().question, QuestionTag::Name);

    let turn = client.submit_text("Jack").await.unwrap();
    assert_eq!(client.captured().get(&Field::Name).map(String::as_str), Some("Jack"));

    // Acknowledgement and question arrive as two entries, the second delayed
    assert_eq!(
        turn.texts(),
        vec!["Nice to meet you, Jack!", "Could you share your LinkedIn profile?"]
    );
    assert_eq!(turn.reveals[0].delay, Duration::ZERO);
    assert_eq!(turn.reveals[1].delay, Duration::from_millis(1000));
    assert!(turn.reveals[0].message.id < turn.reveals[1].message.id);

    assert_eq!(client.state().question, QuestionTag::Linkedin);
    assert_eq!(client.state().input, "https://www.linkedin.com/in/");
    assert_eq!(turn.focus, Focus::Input);
}

#[tokio::test]
async fn split_replies_stay_separate_in_history() {
    let transport = ScriptedTransport::texts(&[
        "Hi there! What's your name?",
        "Nice to meet you, Jack! Could you share your LinkedIn profile?",
        "Thanks! What's the best way to reach you? Your email or phone number works.",
    ]);
    let mut client = ChatClient::new(intake_flow(), transport);
    client.start().await;
    client.submit_text("Jack").await.unwrap();
    client.submit_text("https://www.linkedin.com/in/jack").await.unwrap();

    let roles: Vec<Role> = client.transcript().to_turns().iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::Assistant,
            Role::User,
            Role::Assistant
        ]
    );
    assert_eq!(client.state().question, QuestionTag::Contact);
}

#[tokio::test]
async fn day_selector_submits_comma_joined_days() {
    let transport = ScriptedTransport::texts(&[
        "Which days of the week are you available?",
        "Got it. What time of day works best for you?",
    ]);
    let mut client = ChatClient::new(intake_flow(), transport);
    let opening = client.start().await;
    assert_eq!(opening.focus, Focus::Selector);

    assert_eq!(
        client.continue_selection().await.unwrap_err(),
        ClientError::NoSelection
    );

    client.set_option("Monday", true).unwrap();
    client.toggle_option("Tuesday").unwrap();
    assert_eq!(
        client.toggle_option("Funday").unwrap_err(),
        ClientError::UnknownOption("Funday".to_string())
    );

    let turn = client.continue_selection().await.unwrap();
    let user = &client.transcript().messages()[1];
    assert_eq!(user.author, Author::User);
    assert_eq!(user.text, "Monday, Tuesday");
    assert_eq!(
        client.captured().get(&Field::AvailableDays).map(String::as_str),
        Some("Monday, Tuesday")
    );

    assert_eq!(turn.focus, Focus::Selector);
    assert_eq!(client.state().question, QuestionTag::PreferredTime);
    assert_eq!(client.state().selector.as_ref().unwrap().labels().len(), 3);
}

#[tokio::test]
async fn failed_call_shows_apology_and_allows_retry() {
    let transport = ScriptedTransport::new(vec![
        Ok(reply("Hi there! What's your name?")),
        Err(TransportError::Status {
            status: 500,
            message: "Failed to get a response from the assistant".to_string(),
        }),
        Ok(reply("Nice to meet you, Jack! Could you share your LinkedIn profile?")),
    ]);
    let mut client = ChatClient::new(intake_flow(), transport);
    client.start().await;

    let turn = client.submit_text("Jack").await.unwrap();
    assert_eq!(turn.texts(), vec![APOLOGY]);
    assert_eq!(APOLOGY, "I'm sorry, there was an error. Could you please repeat that?");
    assert_eq!(turn.focus, Focus::Input);
    assert!(!client.state().busy);
    assert_eq!(client.state().question, QuestionTag::Name);

    let retry = client.submit_text("Jack").await.unwrap();
    assert_eq!(retry.reveals.len(), 2);
    assert_eq!(client.state().question, QuestionTag::Linkedin);
}

#[tokio::test]
async fn failed_opening_uses_fallback_line() {
    let mut client = ChatClient::new(intake_flow(), ScriptedTransport::new(vec![]));
    let opening = client.start().await;
    assert_eq!(opening.texts(), vec![FlowConfig::intake().fallback_opening.as_str()]);
    assert_eq!(client.state().question, QuestionTag::Name);
}

#[tokio::test]
async fn share_button_ends_the_conversation() {
    let transport = ScriptedTransport::new(vec![
        Ok(reply("What time of day works best for you?")),
        Ok(ChatReply {
            message: "Perfect. Thanks so much! Someone from our team will be in touch with next steps soon."
                .to_string(),
            show_button: true,
            button_url: Some("https://example.com/share".to_string()),
            question: None,
        }),
    ]);
    let mut client = ChatClient::new(intake_flow(), transport);
    client.start().await;
    client.set_option("Evening", true).unwrap();
    let turn = client.continue_selection().await.unwrap();

    assert_eq!(turn.focus, Focus::None);
    assert_eq!(turn.texts(), vec!["Perfect.", "Thanks so much! Someone from our team will be in touch with next steps soon."]);
    assert!(turn.reveals[0].message.directive.is_none());
    assert_eq!(
        turn.reveals[1].message.directive,
        Some(Directive::ShowButton {
            url: "https://example.com/share".to_string()
        })
    );
    assert!(client.state().finished);
    assert_eq!(client.submit_text("hello?").await.unwrap_err(), ClientError::Finished);
}

#[tokio::test]
async fn contact_acknowledgement_opens_day_selector() {
    let transport = ScriptedTransport::texts(&[
        "What's the best way to reach you? Your email or phone number works.",
        "Got your email or phone. Which days of the week are you available?",
    ]);
    let mut client = ChatClient::new(intake_flow(), transport);
    client.start().await;
    assert_eq!(client.state().question, QuestionTag::Contact);

    let turn = client.submit_text("ann@example.com").await.unwrap();
    assert_eq!(turn.focus, Focus::Selector);
    assert_eq!(client.state().question, QuestionTag::AvailableDays);
    assert!(client.state().selector.is_some());
}

#[tokio::test]
async fn failing_store_does_not_stop_the_chat() {
    let transport = ScriptedTransport::texts(&[
        "Hi there! What's your name?",
        "Nice to meet you! Could you share your LinkedIn profile?",
        "Thanks! Please share your email or phone number.",
    ]);
    let store = FailingStore::new();
    let mut client = ChatClient::new(intake_flow(), transport).with_store(store.clone());
    client.start().await;

    let turn = client.submit_text("Jack").await.unwrap();
    assert_eq!(
        turn.texts(),
        vec!["Nice to meet you!", "Could you share your LinkedIn profile?"]
    );
    assert!(client.record_id().is_none());
    assert!(!client.state().busy);
    assert_eq!(client.state().question, QuestionTag::Linkedin);

    // Without a record id every answer retries the insert with all fields so far
    let turn = client.submit_text("https://www.linkedin.com/in/jack").await.unwrap();
    assert_eq!(turn.texts(), vec!["Thanks! Please share your email or phone number."]);
    assert_eq!(store.attempts(), 2);
    assert!(client.record_id().is_none());
    assert_eq!(client.captured().len(), 2);
    assert_eq!(client.state().question, QuestionTag::Contact);
}

#[tokio::test]
async fn empty_answer_is_rejected() {
    let mut client = ChatClient::new(intake_flow(), ScriptedTransport::texts(&["What's your name?"]));
    client.start().await;
    assert_eq!(client.submit_text("   ").await.unwrap_err(), ClientError::EmptyAnswer);
    assert_eq!(client.transcript().len(), 1);
}

// --- End to end through the in-process relay ---

const INTAKE_SCRIPT: [&str; 7] = [
    "Hi there! What's your name?\n[QUESTION:name]",
    "Nice to meet you, Jack! Could you share your LinkedIn profile?\n[QUESTION:linkedin]",
    "Thanks! What's the best way to reach you? Please share your email or phone number.\n[QUESTION:contact]",
    "Great. Complete this sentence: \"I want to join the bootcamp because...\"\n[QUESTION:motivation]",
    "Love it. Which days of the week are you available?\n[QUESTION:available_days]",
    "Noted. What time of day works best for you?\n[QUESTION:preferred_time]",
    "Thanks so much! Someone from our team will be in touch with next steps soon.\n[SHOW_BUTTON:https://example.com/share]",
];

async fn run_intake(policy: PersistencePolicy) -> (Arc<CountingStore>, Option<String>) {
    let mut flow = FlowConfig::intake();
    flow.persistence.policy = policy;
    let flow = Arc::new(flow);

    let relay = Relay::new(ScriptedProvider::replying(&INTAKE_SCRIPT), flow.clone());
    let store = CountingStore::new();
    let mut client = ChatClient::new(flow, relay).with_store(store.clone());

    client.start().await;
    client.submit_text("Jack").await.unwrap();
    let linkedin = format!("{}jack-doe", client.state().input);
    client.submit_text(&linkedin).await.unwrap();
    client.submit_text("jack@example.com").await.unwrap();
    client.submit_text("I want to ship real products").await.unwrap();
    client.set_option("Monday", true).unwrap();
    client.set_option("Tuesday", true).unwrap();
    client.continue_selection().await.unwrap();
    client.set_option("Evening", true).unwrap();
    let last = client.continue_selection().await.unwrap();

    assert_eq!(last.focus, Focus::None);
    assert_eq!(client.state().button_url.as_deref(), Some("https://example.com/share"));
    (store, client.record_id().map(str::to_string))
}

async fn assert_single_record(store: &CountingStore, id: &str) {
    let rows = store.list(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    let record = &rows[0];
    assert_eq!(record.id, id);
    assert_eq!(record.get(Field::Name), Some("Jack"));
    assert_eq!(record.get(Field::Linkedin), Some("https://www.linkedin.com/in/jack-doe"));
    assert_eq!(record.get(Field::Email), Some("jack@example.com"));
    assert_eq!(record.get(Field::Phone), None);
    assert_eq!(record.get(Field::Motivation), Some("I want to ship real products"));
    assert_eq!(record.get(Field::AvailableDays), Some("Monday, Tuesday"));
    assert_eq!(record.get(Field::PreferredTime), Some("Evening"));
}

#[tokio::test]
async fn incremental_policy_updates_one_row() {
    let (store, id) = run_intake(PersistencePolicy::Incremental).await;
    let id = id.expect("record created");

    assert_eq!(store.inserts(), 1);
    assert_eq!(store.updates(), 5);
    assert_single_record(&store, &id).await;
}

#[tokio::test]
async fn collect_then_insert_writes_once() {
    let (store, id) = run_intake(PersistencePolicy::CollectThenInsert).await;
    let id = id.expect("record created");

    assert_eq!(store.inserts(), 1);
    assert_eq!(store.updates(), 0);
    assert_single_record(&store, &id).await;
}
