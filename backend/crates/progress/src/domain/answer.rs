//! Answer Payload Validation
//!
//! Each exercise kind has its own structural answer schema. The raw JSON
//! payload is parsed into a tagged [`AnswerPayload`] through one exhaustive
//! match over [`ExerciseKind`]; adding a mechanic means adding one arm.
//!
//! Validation is a pure gate: it runs before any state transition or
//! persistence and touches nothing.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::value_objects::ExerciseKind;

/// Structural validation failure, pointing at the offending field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct AnswerError {
    pub field: String,
    pub reason: String,
}

impl AnswerError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Parsed, shape-checked answer payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerPayload {
    /// Clue id -> answer text (crossword-style mechanics)
    Clues(BTreeMap<String, String>),
    /// Statement id -> verdict (true/false mechanics)
    Statements(BTreeMap<String, bool>),
    /// Ordered (left, right) connection pairs (matching-style mechanics)
    Connections(Vec<(String, String)>),
    /// Ordered element ids (timeline/sequence mechanics)
    Sequence(Vec<String>),
    /// Found words (word-search mechanics)
    Words(Vec<String>),
    /// Question id -> free-text answer (question-driven mechanics)
    Responses(BTreeMap<String, String>),
    /// One long-form text with a per-kind minimum length
    LongForm(String),
}

/// Minimum character count for long-form mechanics
const fn min_chars(kind: ExerciseKind) -> usize {
    match kind {
        ExerciseKind::ArgumentativeEssay => 200,
        _ => 100,
    }
}

/// Validate a raw answer payload against the schema for `kind`
///
/// Returns the parsed payload so graders can work with typed data instead of
/// re-walking the JSON.
pub fn validate(kind: ExerciseKind, payload: &Value) -> Result<AnswerPayload, AnswerError> {
    match kind {
        ExerciseKind::Crossword => Ok(AnswerPayload::Clues(non_empty_string_map(
            payload, "clues",
        )?)),

        ExerciseKind::TrueFalse => Ok(AnswerPayload::Statements(bool_map(
            payload,
            "statements",
        )?)),

        ExerciseKind::Matching | ExerciseKind::ConceptMap => Ok(AnswerPayload::Connections(
            connection_pairs(payload, "connections")?,
        )),

        ExerciseKind::Timeline => Ok(AnswerPayload::Sequence(string_list(payload, "order")?)),

        ExerciseKind::WordSearch => Ok(AnswerPayload::Words(string_list(payload, "words")?)),

        ExerciseKind::TextDetective
        | ExerciseKind::HypothesisBuilding
        | ExerciseKind::NarrativePrediction
        | ExerciseKind::ContextPuzzle
        | ExerciseKind::InferenceWheel
        | ExerciseKind::OpinionTribunal
        | ExerciseKind::SourceAnalysis
        | ExerciseKind::PerspectiveMatrix
        | ExerciseKind::FillBlanks => Ok(AnswerPayload::Responses(non_empty_string_map(
            payload,
            "questions",
        )?)),

        ExerciseKind::DigitalDebate
        | ExerciseKind::ArgumentativePodcast
        | ExerciseKind::ArgumentativeEssay => {
            let text = long_form(payload, "text", min_chars(kind))?;
            Ok(AnswerPayload::LongForm(text))
        }
    }
}

// ============================================================================
// Shape helpers
// ============================================================================

fn object_field<'a>(payload: &'a Value, field: &str) -> Result<&'a Value, AnswerError> {
    let object = payload
        .as_object()
        .ok_or_else(|| AnswerError::new(field, "answer payload must be a JSON object"))?;
    object
        .get(field)
        .ok_or_else(|| AnswerError::new(field, "missing required field"))
}

fn non_empty_string_map(
    payload: &Value,
    field: &str,
) -> Result<BTreeMap<String, String>, AnswerError> {
    let value = object_field(payload, field)?;
    let object = value
        .as_object()
        .ok_or_else(|| AnswerError::new(field, "must be an object of id to text"))?;
    if object.is_empty() {
        return Err(AnswerError::new(field, "must not be empty"));
    }

    let mut map = BTreeMap::new();
    for (id, answer) in object {
        let text = answer
            .as_str()
            .ok_or_else(|| AnswerError::new(format!("{field}.{id}"), "must be a string"))?;
        if text.trim().is_empty() {
            return Err(AnswerError::new(
                format!("{field}.{id}"),
                "must not be blank",
            ));
        }
        map.insert(id.clone(), text.to_string());
    }
    Ok(map)
}

fn bool_map(payload: &Value, field: &str) -> Result<BTreeMap<String, bool>, AnswerError> {
    let value = object_field(payload, field)?;
    let object = value
        .as_object()
        .ok_or_else(|| AnswerError::new(field, "must be an object of id to boolean"))?;
    if object.is_empty() {
        return Err(AnswerError::new(field, "must not be empty"));
    }

    let mut map = BTreeMap::new();
    for (id, verdict) in object {
        let flag = verdict
            .as_bool()
            .ok_or_else(|| AnswerError::new(format!("{field}.{id}"), "must be a boolean"))?;
        map.insert(id.clone(), flag);
    }
    Ok(map)
}

fn connection_pairs(
    payload: &Value,
    field: &str,
) -> Result<Vec<(String, String)>, AnswerError> {
    let value = object_field(payload, field)?;
    let list = value
        .as_array()
        .ok_or_else(|| AnswerError::new(field, "must be an array of [left, right] pairs"))?;
    if list.is_empty() {
        return Err(AnswerError::new(field, "must not be empty"));
    }

    let mut pairs = Vec::with_capacity(list.len());
    for (index, entry) in list.iter().enumerate() {
        let pair = entry
            .as_array()
            .filter(|pair| pair.len() == 2)
            .ok_or_else(|| {
                AnswerError::new(format!("{field}[{index}]"), "must be a [left, right] pair")
            })?;
        let left = pair[0].as_str().ok_or_else(|| {
            AnswerError::new(format!("{field}[{index}][0]"), "must be a string")
        })?;
        let right = pair[1].as_str().ok_or_else(|| {
            AnswerError::new(format!("{field}[{index}][1]"), "must be a string")
        })?;
        pairs.push((left.to_string(), right.to_string()));
    }
    Ok(pairs)
}

fn string_list(payload: &Value, field: &str) -> Result<Vec<String>, AnswerError> {
    let value = object_field(payload, field)?;
    let list = value
        .as_array()
        .ok_or_else(|| AnswerError::new(field, "must be an array of strings"))?;
    if list.is_empty() {
        return Err(AnswerError::new(field, "must not be empty"));
    }

    let mut items = Vec::with_capacity(list.len());
    for (index, entry) in list.iter().enumerate() {
        let item = entry
            .as_str()
            .ok_or_else(|| AnswerError::new(format!("{field}[{index}]"), "must be a string"))?;
        if item.trim().is_empty() {
            return Err(AnswerError::new(
                format!("{field}[{index}]"),
                "must not be blank",
            ));
        }
        items.push(item.to_string());
    }
    Ok(items)
}

fn long_form(payload: &Value, field: &str, min_chars: usize) -> Result<String, AnswerError> {
    let value = object_field(payload, field)?;
    let text = value
        .as_str()
        .ok_or_else(|| AnswerError::new(field, "must be a string"))?;
    let trimmed = text.trim();
    if trimmed.chars().count() < min_chars {
        return Err(AnswerError::new(
            field,
            format!("must be at least {min_chars} characters"),
        ));
    }
    Ok(trimmed.to_string())
}
