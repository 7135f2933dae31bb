pub mod error;
pub mod fetcher;
pub mod probe;
pub mod result;

pub use error::ScanError;
pub use fetcher::PageFetcher;
pub use probe::{EncodingProbe, HttpEncodingProbe};
pub use result::PageRetrieval;
