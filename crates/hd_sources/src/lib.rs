pub mod extractor;
pub mod hackernews;

pub use extractor::HtmlExtractor;
pub use hackernews::HackerNewsFeed;

pub mod prelude {
    pub use super::{HackerNewsFeed, HtmlExtractor};
    pub use hd_core::{Error, Extractor, Feed, Result, StoryDetail};
}
