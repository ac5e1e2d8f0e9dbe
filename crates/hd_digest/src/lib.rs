pub mod pipeline;
pub mod preferences;
pub mod reactions;
pub mod run_lock;
pub mod senders;
pub mod shutdown;
#[cfg(test)]
mod testing;

pub use pipeline::{CycleReport, DeliveredItem, DigestPipeline, SkipStage, SkippedItem};
pub use preferences::PreferenceModel;
pub use reactions::{ReactionOutcome, ReactionProcessor};
pub use run_lock::RunLock;
pub use senders::{create_sender, ConsoleSender, TelegramSender};
pub use shutdown::Shutdown;

pub mod prelude {
    pub use super::{
        create_sender, CycleReport, DigestPipeline, PreferenceModel, ReactionOutcome, ReactionProcessor, Shutdown,
    };
    pub use hd_core::{DigestConfig, Error, Result};
}
