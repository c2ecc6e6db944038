use std::time::Duration;

use quizlens_engine::dom::Document;
use quizlens_engine::run::EngineConfig;
use quizlens_engine::{api, highlight, Engine};
use serde_json::json;

fn page() -> Document {
    Document::parse(concat!(
        r#"<body><div class="qtext">Thủ đô của Việt Nam là gì?</div>"#,
        "<div>A. Hà Nội</div></body>",
    ))
}

fn compare_msg() -> String {
    json!({
        "action": "compareQuestions",
        "questions": [{ "question": "Thủ đô của Việt Nam là gì?", "answer": "Hà Nội" }],
    })
    .to_string()
}

#[test]
fn second_call_inside_the_window_reports_zero_and_leaves_the_page_alone() {
    let mut engine = Engine::new();
    let mut doc = page();

    let first = api::handle_message(&mut engine, &mut doc, &compare_msg());
    assert_eq!(first["matchedQuestions"], 1);
    let tooltips_after_first = doc
        .elements()
        .into_iter()
        .filter(|&n| doc.has_class(n, highlight::TOOLTIP_CLASS))
        .count();

    let second = api::handle_message(&mut engine, &mut doc, &compare_msg());
    assert_eq!(second["success"], true);
    assert_eq!(second["matchedQuestions"], 0);
    assert_eq!(second["totalPageQuestions"], 0);
    let tooltips_after_second = doc
        .elements()
        .into_iter()
        .filter(|&n| doc.has_class(n, highlight::TOOLTIP_CLASS))
        .count();
    assert_eq!(tooltips_after_first, tooltips_after_second);
}

#[test]
fn a_short_window_expires_and_the_engine_runs_again() {
    let mut engine = Engine::with_config(EngineConfig {
        debounce: Duration::from_millis(50),
        ..EngineConfig::default()
    });
    let mut doc = page();

    let first = api::handle_message(&mut engine, &mut doc, &compare_msg());
    assert_eq!(first["matchedQuestions"], 1);
    std::thread::sleep(Duration::from_millis(150));
    let second = api::handle_message(&mut engine, &mut doc, &compare_msg());
    assert_eq!(second["matchedQuestions"], 1);
}

#[test]
fn engines_debounce_independently() {
    let mut a = Engine::new();
    let mut b = Engine::new();
    let mut doc_a = page();
    let mut doc_b = page();

    let first = api::handle_message(&mut a, &mut doc_a, &compare_msg());
    assert_eq!(first["matchedQuestions"], 1);
    // A's window must not swallow B's first run.
    let other = api::handle_message(&mut b, &mut doc_b, &compare_msg());
    assert_eq!(other["matchedQuestions"], 1);
}

#[test]
fn debounced_calls_do_not_extend_the_window() {
    let mut engine = Engine::with_config(EngineConfig {
        debounce: Duration::from_millis(500),
        ..EngineConfig::default()
    });
    let mut doc = page();

    assert_eq!(
        api::handle_message(&mut engine, &mut doc, &compare_msg())["matchedQuestions"],
        1
    );
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(
        api::handle_message(&mut engine, &mut doc, &compare_msg())["matchedQuestions"],
        0
    );
    std::thread::sleep(Duration::from_millis(600));
    assert_eq!(
        api::handle_message(&mut engine, &mut doc, &compare_msg())["matchedQuestions"],
        1
    );
}
