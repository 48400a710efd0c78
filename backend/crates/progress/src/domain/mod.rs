//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Exercise, ExerciseSubmission)
//! - Domain value objects (SubmissionStatus, ExerciseKind)
//! - Answer payload validation (pure gate, one schema per kind)
//! - The reward calculator (pure functions)
//! - Repository and external-collaborator traits

pub mod answer;
pub mod entities;
pub mod oracle;
pub mod repository;
pub mod rewards;
pub mod value_objects;
