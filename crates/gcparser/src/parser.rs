use std::collections::BTreeMap;

use async_trait::async_trait;
use gc_fetcher::Fetcher;

use crate::error::Error;
use crate::record::Record;

/// A page parser that can be registered under a name.
#[async_trait]
pub trait Parser: Send + Sync {
    async fn parse(&self, fetcher: &Fetcher, args: &ParseArgs) -> anyhow::Result<Record>;
}

/// Named arguments of a parser call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseArgs(BTreeMap<String, String>);

impl ParseArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `key=value` pairs, a bare `key` is a set flag.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').unwrap_or((pair, "true"));
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidArgs(format!("missing key in {pair:?}")));
            }
            args.insert(key, value);
        }
        Ok(args)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, Error> {
        self.get(key)
            .ok_or_else(|| Error::InvalidArgs(format!("missing {key:?}")))
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "yes" | "y" | "on" | "1")
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_and_flags() {
        let args = ParseArgs::from_pairs(["guid=abc-1", "logs", "note=a=b"]).unwrap();
        assert_eq!(args.get("guid"), Some("abc-1"));
        assert_eq!(args.get("note"), Some("a=b"));
        assert!(args.flag("logs"));
        assert!(!args.flag("missing"));
        assert!(!ParseArgs::new().with("logs", "no").flag("logs"));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            ParseArgs::from_pairs(["=value"]),
            Err(Error::InvalidArgs(_))
        ));
    }
}
