mod cache;
mod error;
mod my_finds;
pub mod ns;
mod parser;
mod profile;
mod record;
mod registry;
pub mod text;

pub use cache::{cache_url, fetch_cache, parse_cache_details, parse_coordinates, CacheParser};
pub use error::Error;
pub use my_finds::{fetch_my_finds, parse_my_finds, MyFindsParser};
pub use parser::{ParseArgs, Parser};
pub use profile::{profile_form, save_profile, EditProfile};
pub use record::{CacheDetails, CacheId, FoundLog, LogCount, MyFinds, Record, Trackable};
pub use registry::GcParser;

pub use anyhow;
pub use async_trait::async_trait;
pub use gc_fetcher::{self as fetcher, Fetcher, FetcherConfig};
