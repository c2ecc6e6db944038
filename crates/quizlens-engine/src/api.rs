//! Message surface: action-tagged requests and JSON envelope responses.
//!
//! Every response is a plain JSON object with a `success` flag; malformed
//! requests come back as an error envelope rather than a transport failure,
//! so a misbehaving caller can always read why it was rejected.

use serde::Deserialize;
use serde_json::{json, Value};

use quizlens_core::{Error, PageInfo, QuestionAnswerRecord};

use crate::dom::Document;
use crate::highlight;
use crate::run::Engine;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetPageInfo,
    CompareQuestions {
        #[serde(default)]
        questions: Vec<QuestionAnswerRecord>,
    },
    ClearHighlights,
    ToggleDebug,
}

/// Parse and dispatch a raw JSON message. Unknown actions and malformed
/// payloads produce an error envelope.
pub fn handle_message(engine: &mut Engine, doc: &mut Document, raw: &str) -> Value {
    match serde_json::from_str::<Request>(raw) {
        Ok(req) => handle_request(engine, doc, req),
        Err(e) => error_obj(&Error::InvalidRequest(e.to_string()).to_string()),
    }
}

pub fn handle_request(engine: &mut Engine, doc: &mut Document, req: Request) -> Value {
    match req {
        Request::GetPageInfo => {
            let info = page_info(doc);
            json!({
                "success": true,
                "url": info.url,
                "title": info.title,
                "domain": info.domain,
            })
        }
        Request::CompareQuestions { questions } => {
            let outcome = engine.run_comparison(doc, &questions);
            json!({
                "success": true,
                "matchedQuestions": outcome.matched.len(),
                "totalPageQuestions": outcome.page_questions.len(),
            })
        }
        Request::ClearHighlights => {
            highlight::clear_all(doc);
            json!({ "success": true })
        }
        Request::ToggleDebug => {
            let enabled = engine.toggle_debug();
            json!({ "success": true, "debugEnabled": enabled })
        }
    }
}

/// Page identity from the document's origin and `<title>`. Pages parsed
/// without an origin report empty url and domain.
pub fn page_info(doc: &Document) -> PageInfo {
    let (url, domain) = match doc.origin() {
        Some(origin) => (
            origin.to_string(),
            origin.host_str().unwrap_or("").to_string(),
        ),
        None => (String::new(), String::new()),
    };
    PageInfo {
        url,
        title: doc.title().unwrap_or_default(),
        domain,
    }
}

fn error_obj(msg: &str) -> Value {
    json!({ "success": false, "error": msg })
}
