use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use time::{Duration, OffsetDateTime};

use crate::error::Result;

/// Cookie store for a single site, keyed by cookie name.
///
/// Domains and paths are ignored: every cookie is sent with every
/// authenticated request, which is what the site's login session needs.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<BTreeMap<String, String>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Applies a raw `Set-Cookie` header value.
    pub fn set_cookie(&self, header: &str) {
        let Some((name, value, removed)) = parse_set_cookie(header) else {
            log::warn!("Ignoring malformed cookie: {header}");
            return;
        };
        let mut cookies = self.write();
        if removed {
            cookies.remove(&name);
        } else {
            cookies.insert(name, value);
        }
    }

    /// Replaces the jar content with the cookies stored at `path`.
    pub fn load(&self, path: &Path) -> Result<()> {
        let stored: BTreeMap<String, String> = serde_json::from_str(&fs::read_to_string(path)?)?;
        *self.write() = stored;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.read())?;
        fs::write(path, json)?;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.cookies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.cookies.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {
        for header in cookie_headers {
            match header.to_str() {
                Ok(header) => self.set_cookie(header),
                Err(e) => log::warn!("Ignoring non-ascii cookie: {e}"),
            }
        }
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        let cookies = self.read();
        if cookies.is_empty() {
            return None;
        }
        let header = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

/// Returns the cookie name, its value, and whether the header deletes it.
///
/// A cookie is deleted by an empty value, a non-positive `Max-Age` or an
/// `Expires` date in the past.
fn parse_set_cookie(header: &str) -> Option<(String, String, bool)> {
    let cookie = Cookie::parse(header).ok()?;
    let value = cookie.value().trim_matches('"');

    let max_age_elapsed = cookie
        .max_age()
        .map(|age| age <= Duration::ZERO)
        .unwrap_or(false);
    let expired = cookie
        .expires_datetime()
        .map(|at| at <= OffsetDateTime::now_utc())
        .unwrap_or(false);

    Some((
        cookie.name().to_string(),
        value.to_string(),
        max_age_elapsed || expired || value.is_empty(),
    ))
}
