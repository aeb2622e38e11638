pub mod authority;
pub mod cache;
pub mod data;
mod fetch;

pub use authority::Authority;
pub use data::{FeedStatus, TransitData};
pub use fetch::{FeedFetcher, FetchError, HttpFetcher};
