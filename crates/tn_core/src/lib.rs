pub mod article;
pub mod error;
pub mod merge;
pub mod record;

pub use article::{Article, RawArticle};
pub use error::Error;
pub use merge::{MergeConfig, MergeReport, NewsMerger};
pub use record::{Sentiment, TickerRecord};

pub type Result<T> = std::result::Result<T, Error>;
