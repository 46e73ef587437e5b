//! docsort - sort documents into company/category/year folders
//!
//! This library recognizes company names in file paths through normalized
//! fuzzy matching, classifies files by extension and filing date, moves
//! them into a `Company/Category/Year` structure, and records every move
//! in a CSV log so whole runs can be undone.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod decision;
pub mod matcher;
pub mod normalizer;
pub mod organizer;
pub mod output;
pub mod profile;
pub mod scorer;
pub mod undo;

pub use classifier::{Classification, Classifier, DateExtractor, ExtensionMapper, FileCategory};
pub use config::{CompiledConfig, ConfigError, OrganizerConfig};
pub use decision::{DecisionRecord, UNRECOGNIZED_BUCKET};
pub use matcher::{CompanyMatcher, MatchDecision, MatchField};
pub use organizer::{FileOrganizer, Operation, OperationLog, OrganizeError};
pub use profile::{CompanyProfile, MatchSettings, ProfileStore};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Cli, Command, run};
