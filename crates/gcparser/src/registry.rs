use gc_fetcher::{Fetcher, FetcherConfig};

use crate::cache::{fetch_cache, CacheParser};
use crate::error::Error;
use crate::my_finds::{fetch_my_finds, MyFindsParser};
use crate::ns;
use crate::parser::{ParseArgs, Parser};
use crate::profile::{save_profile, EditProfile};
use crate::record::{CacheDetails, CacheId, MyFinds, Record};

/// Entry point of the library: a logged-in fetcher and the parsers using it.
///
/// Parsers are kept in registration order, the built-in ones first.
pub struct GcParser {
    fetcher: Fetcher,
    parsers: Vec<(String, Box<dyn Parser>)>,
}

impl GcParser {
    pub fn new(config: FetcherConfig) -> gc_fetcher::Result<Self> {
        Ok(Self::with_fetcher(Fetcher::new(config)?))
    }

    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        let mut gc = Self {
            fetcher,
            parsers: vec![],
        };
        gc.register_parser(ns::parsers::MY_FINDS, MyFindsParser);
        gc.register_parser(ns::parsers::CACHE, CacheParser);
        gc.register_parser(ns::parsers::EDIT_PROFILE, EditProfile);
        gc
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Registers a parser, replacing any parser of the same name in place.
    pub fn register_parser<P>(&mut self, name: &str, parser: P)
    where
        P: Parser + 'static,
    {
        match self.parsers.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => {
                log::debug!("Replacing parser {name:?}.");
                *existing = Box::new(parser);
            }
            None => self.parsers.push((name.to_string(), Box::new(parser))),
        }
    }

    pub fn parser_names(&self) -> impl Iterator<Item = &str> {
        self.parsers.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_parser(&self, name: &str) -> bool {
        self.parsers.iter().any(|(n, _)| n == name)
    }

    /// Calls the parser registered as `name`.
    pub async fn parse(&self, name: &str, args: &ParseArgs) -> anyhow::Result<Record> {
        let (_, parser) = self
            .parsers
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| Error::UnknownParser(name.to_string()))?;
        log::debug!("Calling parser {name:?}.");
        parser.parse(&self.fetcher, args).await
    }

    pub async fn cache(&self, id: &CacheId, logs: bool) -> anyhow::Result<CacheDetails> {
        fetch_cache(&self.fetcher, id, logs).await
    }

    pub async fn my_finds(&self) -> anyhow::Result<MyFinds> {
        fetch_my_finds(&self.fetcher).await
    }

    pub async fn edit_profile(&self, details: &str) -> anyhow::Result<()> {
        save_profile(&self.fetcher, details).await
    }
}
