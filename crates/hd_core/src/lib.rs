pub mod config;
pub mod delivery;
pub mod error;
pub mod models;
pub mod preferences;
pub mod scoring;
pub mod sources;
pub mod storage;
pub mod types;

pub use config::DigestConfig;
pub use delivery::Sender;
pub use error::{Error, Result};
pub use models::Summarizer;
pub use scoring::{ScoredItem, ScoringWeights};
pub use sources::{Extractor, Feed};
pub use storage::DigestStore;
pub use types::{Item, ItemId, Like, MessageId, StoryDetail, Summary, TagWeight};
