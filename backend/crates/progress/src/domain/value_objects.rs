//! Domain Value Objects
//!
//! The submission status state machine and the closed exercise-kind enum.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SubmissionStatus - The grading lifecycle state machine
// ============================================================================

/// Exercise submission status
///
/// Lifecycle: `draft → submitted → graded → reviewed`, with one allowed
/// revert (`submitted → draft`). Every other transition is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Work in progress, not yet handed in
    #[default]
    Draft,
    /// Handed in, waiting for the grading oracle
    Submitted,
    /// Scored; answer edits are locked
    Graded,
    /// Teacher feedback attached; terminal
    Reviewed,
}

impl SubmissionStatus {
    /// Get string code for database storage and serialization
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Graded => "graded",
            Self::Reviewed => "reviewed",
        }
    }

    /// Create from string code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "graded" => Some(Self::Graded),
            "reviewed" => Some(Self::Reviewed),
            _ => None,
        }
    }

    /// Whether moving to `to` is a legal transition
    #[inline]
    pub const fn can_transition(&self, to: SubmissionStatus) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Submitted)
                | (Self::Submitted, Self::Graded)
                | (Self::Submitted, Self::Draft)
                | (Self::Graded, Self::Reviewed)
        )
    }

    /// Whether the answer payload may still be edited
    #[inline]
    pub const fn allows_answer_edit(&self) -> bool {
        matches!(self, Self::Draft | Self::Submitted)
    }

    /// Whether this is a terminal state (cannot transition out)
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Reviewed)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// ExerciseKind - Closed set of exercise mechanics
// ============================================================================

/// Exercise kind
///
/// Every kind carries its own answer-payload schema (see `domain::answer`).
/// Adding a mechanic means adding a variant here and one arm to the schema
/// dispatch; nothing else changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    // Literal comprehension
    Crossword,
    Timeline,
    WordSearch,
    ConceptMap,
    Matching,
    // Inferential comprehension
    TextDetective,
    HypothesisBuilding,
    NarrativePrediction,
    ContextPuzzle,
    InferenceWheel,
    // Critical comprehension
    OpinionTribunal,
    DigitalDebate,
    SourceAnalysis,
    ArgumentativePodcast,
    PerspectiveMatrix,
    // Digital literacy
    ArgumentativeEssay,
    // Auxiliary mechanics
    TrueFalse,
    FillBlanks,
}

impl ExerciseKind {
    /// All kinds, in canonical order
    pub const ALL: [ExerciseKind; 18] = [
        Self::Crossword,
        Self::Timeline,
        Self::WordSearch,
        Self::ConceptMap,
        Self::Matching,
        Self::TextDetective,
        Self::HypothesisBuilding,
        Self::NarrativePrediction,
        Self::ContextPuzzle,
        Self::InferenceWheel,
        Self::OpinionTribunal,
        Self::DigitalDebate,
        Self::SourceAnalysis,
        Self::ArgumentativePodcast,
        Self::PerspectiveMatrix,
        Self::ArgumentativeEssay,
        Self::TrueFalse,
        Self::FillBlanks,
    ];

    /// Get string code for database storage and serialization
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Crossword => "crossword",
            Self::Timeline => "timeline",
            Self::WordSearch => "word_search",
            Self::ConceptMap => "concept_map",
            Self::Matching => "matching",
            Self::TextDetective => "text_detective",
            Self::HypothesisBuilding => "hypothesis_building",
            Self::NarrativePrediction => "narrative_prediction",
            Self::ContextPuzzle => "context_puzzle",
            Self::InferenceWheel => "inference_wheel",
            Self::OpinionTribunal => "opinion_tribunal",
            Self::DigitalDebate => "digital_debate",
            Self::SourceAnalysis => "source_analysis",
            Self::ArgumentativePodcast => "argumentative_podcast",
            Self::PerspectiveMatrix => "perspective_matrix",
            Self::ArgumentativeEssay => "argumentative_essay",
            Self::TrueFalse => "true_false",
            Self::FillBlanks => "fill_blanks",
        }
    }

    /// Create from string code
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Comprehension family this mechanic trains
    #[inline]
    pub const fn family(&self) -> &'static str {
        match self {
            Self::Crossword
            | Self::Timeline
            | Self::WordSearch
            | Self::ConceptMap
            | Self::Matching => "literal",
            Self::TextDetective
            | Self::HypothesisBuilding
            | Self::NarrativePrediction
            | Self::ContextPuzzle
            | Self::InferenceWheel => "inferential",
            Self::OpinionTribunal
            | Self::DigitalDebate
            | Self::SourceAnalysis
            | Self::ArgumentativePodcast
            | Self::PerspectiveMatrix => "critical",
            Self::ArgumentativeEssay => "digital",
            Self::TrueFalse | Self::FillBlanks => "auxiliary",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
