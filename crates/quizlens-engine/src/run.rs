//! Comparison-run orchestration: debounce, single-flight, match loop.
//!
//! One `Engine` belongs to one page session. Runs mutate the document in
//! place; callers that need a pristine page between runs call
//! `highlight::clear_all` first.

use std::time::{Duration, Instant};

use quizlens_core::QuestionAnswerRecord;

use crate::dom::{Document, NodeId};
use crate::extract::{self, Candidate};
use crate::highlight;
use crate::locate;
use crate::similarity;

/// Tunables for a comparison run. Defaults mirror production behavior; tests
/// shrink the debounce window to zero.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub debounce: Duration,
    pub question_threshold: f64,
    pub answer_threshold: f64,
    pub length_gate: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            debounce: Duration::from_millis(2000),
            question_threshold: similarity::QUESTION_THRESHOLD,
            answer_threshold: similarity::ANSWER_THRESHOLD,
            length_gate: similarity::LENGTH_GATE,
        }
    }
}

#[derive(Debug, Default)]
struct RunState {
    in_flight: bool,
    last_run: Option<Instant>,
}

/// One page session's comparison engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    state: RunState,
    debug: bool,
}

/// A page question matched against one corpus record.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub candidate: Candidate,
    pub record: QuestionAnswerRecord,
    pub matched_answer_node: Option<NodeId>,
}

/// What one comparison run did: the matches plus every candidate the page
/// yielded, matched or not.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub matched: Vec<MatchResult>,
    pub page_questions: Vec<Candidate>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Engine {
            config,
            state: RunState::default(),
            debug: false,
        }
    }

    pub fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Match the corpus against the page and decorate what matches. A call
    /// that lands inside the debounce window, or while another run is in
    /// flight, returns an empty outcome without touching the document.
    pub fn run_comparison(
        &mut self,
        doc: &mut Document,
        records: &[QuestionAnswerRecord],
    ) -> RunOutcome {
        if self.state.in_flight {
            tracing::debug!("comparison already in flight, skipping");
            return RunOutcome::default();
        }
        if let Some(last) = self.state.last_run {
            if last.elapsed() < self.config.debounce {
                tracing::debug!("debounced, skipping");
                return RunOutcome::default();
            }
        }
        self.state.in_flight = true;
        self.state.last_run = Some(Instant::now());
        let outcome = self.run_pass(doc, records);
        self.state.in_flight = false;
        outcome
    }

    fn run_pass(&self, doc: &mut Document, records: &[QuestionAnswerRecord]) -> RunOutcome {
        let candidates = extract::extract_candidates(doc);
        let mut matched = Vec::new();
        tracing::debug!(candidates = candidates.len(), records = records.len(), "comparison pass");

        for candidate in &candidates {
            for record in records {
                let corpus_question = extract::clean_question_text(&record.question);
                if corpus_question.is_empty() {
                    continue;
                }
                if !similarity::similar(
                    &candidate.normalized_text,
                    &corpus_question,
                    self.config.length_gate,
                    self.config.question_threshold,
                ) {
                    continue;
                }
                if self.debug {
                    tracing::debug!(
                        page = %candidate.normalized_text,
                        corpus = %corpus_question,
                        reason = ?candidate.reason,
                        "question matched"
                    );
                }
                // Locate before decorating: the tooltip carries the answer
                // text and must not pollute the option scan.
                let answer_node = locate::find_answer_node(
                    doc,
                    candidate.node,
                    &record.answer,
                    self.config.answer_threshold,
                );
                highlight::highlight_question(doc, candidate.node, &record.answer);
                if let Some(n) = answer_node {
                    highlight::highlight_answer(doc, n);
                }
                matched.push(MatchResult {
                    candidate: candidate.clone(),
                    record: record.clone(),
                    matched_answer_node: answer_node,
                });
                break;
            }
        }
        RunOutcome {
            matched,
            page_questions: candidates,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
