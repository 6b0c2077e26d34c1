pub mod collection_ext;
pub mod error;
pub mod string_ext;

pub use collection_ext::{group_by_many, unique_ordered};
pub use error::{AnalyzerError, AnalyzerResult};
pub use string_ext::{StringExt, clean_optional_string, truncate_chars};
