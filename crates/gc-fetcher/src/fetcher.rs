use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::header::{ACCEPT, ACCEPT_CHARSET, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, ClientBuilder, Url};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::{expand_home, FetcherConfig};
use crate::cookies::CookieJar;
use crate::error::{Error, Result};
use crate::form::{hidden_inputs, set_field, Form};
use crate::throttle::Throttle;
use crate::user_agent::random_user_agent;

const ACCEPT_VALUE: &str = "text/xml,application/xml,application/xhtml+xml,text/html;q=0.9,text/plain;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-us,en;q=0.5";
const ACCEPT_CHARSET_VALUE: &str = "utf-8,*;q=0.5";

/// Cookie present only while logged in.
pub const SESSION_COOKIE: &str = "userid";

const NOT_LOGGED_IN: &str = "You are not logged in.";

/// How a page is fetched with respect to the login session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Plain request, no cookies.
    Anonymous,
    /// Logged in request, logs in again when the page says we are not.
    Session,
    /// Logged in request, the page is returned as is.
    SessionUnchecked,
}

#[derive(Debug)]
pub struct Fetcher {
    config: FetcherConfig,
    base_url: Url,
    user_file: Option<PathBuf>,
    user_agent: String,
    cookies: Arc<CookieJar>,
    client: Client,
    session_client: Client,
    throttle: Mutex<Throttle>,
    /// Login generation, 0 until a session is established.
    session: Mutex<u64>,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self> {
        if !config.has_credentials() {
            log::warn!("No geocaching.com credentials given, some features will be disabled.");
        }

        let base_url =
            Url::parse(&config.base_url).map_err(|_| Error::InvalidUrl(config.base_url.clone()))?;

        let data_dir = config.data_dir.as_deref().map(expand_home).and_then(|dir| {
            if dir.is_dir() {
                log::info!("Setting data directory to '{}'.", dir.display());
                Some(dir)
            } else {
                log::warn!(
                    "Data directory '{}' does not exist, saving cookies will be disabled.",
                    dir.display()
                );
                None
            }
        });

        let user_file = match (&config.username, &data_dir) {
            (Some(username), Some(dir)) => Some(user_file_name(dir, username)),
            _ => None,
        };

        let user_agent = match &config.user_agent {
            Some(ua) => ua.clone(),
            None => user_file
                .as_deref()
                .and_then(load_user_agent)
                .unwrap_or_else(|| random_user_agent(&mut rand::thread_rng())),
        };

        let cookies = Arc::new(CookieJar::new());
        let client = client_builder(&config).build()?;
        let session_client = client_builder(&config)
            .cookie_provider(cookies.clone())
            .build()?;
        let throttle = Mutex::new(Throttle::new(config.throttle));

        Ok(Self {
            config,
            base_url,
            user_file,
            user_agent,
            cookies,
            client,
            session_client,
            throttle,
            session: Mutex::new(0),
        })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Base path of the per-user files in the data directory.
    pub fn user_file(&self) -> Option<&Path> {
        self.user_file.as_deref()
    }

    pub async fn fetch_count(&self) -> usize {
        self.throttle.lock().await.fetch_count()
    }

    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.base_url
            .join(url)
            .map_err(|_| Error::InvalidUrl(url.to_string()))
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.fetch(url, Auth::Anonymous, None).await
    }

    pub async fn get_authenticated(&self, url: &str) -> Result<String> {
        self.fetch(url, Auth::Session, None).await
    }

    pub async fn post_authenticated(&self, url: &str, form: &Form) -> Result<String> {
        self.fetch(url, Auth::Session, Some(form)).await
    }

    /// Fetches a page, relative urls are joined to the configured base url.
    ///
    /// A `form` turns the request into an urlencoded POST.
    pub async fn fetch(&self, url: &str, auth: Auth, form: Option<&Form>) -> Result<String> {
        let url = self.resolve(url)?;
        let generation = match auth {
            Auth::Anonymous => 0,
            Auth::Session | Auth::SessionUnchecked => self.ensure_session().await?,
        };

        let page = self.download(&url, auth, form).await?;
        if auth == Auth::Session && !check_login(&page) {
            log::debug!("We're not actually logged in, refreshing login and redownloading page.");
            self.refresh_session(generation).await?;
            return self.download(&url, auth, form).await;
        }

        Ok(page)
    }

    /// Logs in to geocaching.com, giving it a second try on failure.
    pub async fn login(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        self.login_locked().await?;
        *session += 1;
        Ok(())
    }

    /// Logs in again unless another task did since `generation` was current.
    async fn refresh_session(&self, generation: u64) -> Result<()> {
        let mut session = self.session.lock().await;
        if *session != generation {
            log::debug!("Session already refreshed.");
            return Ok(());
        }
        self.login_locked().await?;
        *session += 1;
        Ok(())
    }

    /// Must be called with the session lock held.
    async fn login_locked(&self) -> Result<()> {
        self.cookies.clear();

        let mut logged = self.login_attempt().await?;
        if !logged {
            log::debug!("Not logged in, re-trying.");
            logged = self.login_attempt().await?;
        }
        if !logged {
            log::error!("Login error.");
            return Err(Error::Login);
        }

        log::debug!("Logged in.");
        self.save_cookies();
        Ok(())
    }

    async fn login_attempt(&self) -> Result<bool> {
        log::debug!("Attempting to log in.");
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            log::error!("Cannot log in - no credentials available.");
            return Err(Error::Credentials);
        };

        let home = self.resolve("/")?;
        let page = self.download(&home, Auth::SessionUnchecked, None).await?;

        let mut form = hidden_inputs(&page);
        set_field(&mut form, "ctl00$MiniProfile$loginUsername", username);
        set_field(&mut form, "ctl00$MiniProfile$loginPassword", password);
        set_field(&mut form, "ctl00$MiniProfile$LoginBtn", "Go");
        set_field(&mut form, "ctl00$MiniProfile$loginRemember", "on");

        let target = self.resolve("/Default.aspx")?;
        self.download(&target, Auth::SessionUnchecked, Some(&form))
            .await?;

        Ok(self.cookies.contains(SESSION_COOKIE))
    }

    /// Returns the current login generation.
    async fn ensure_session(&self) -> Result<u64> {
        let mut session = self.session.lock().await;
        if *session > 0 {
            return Ok(*session);
        }

        if self.config.username.is_none() {
            log::error!("Username not available.");
            return Err(Error::Credentials);
        }

        match self.cookie_file() {
            Some(path) if path.is_file() => {
                log::debug!("Re-using stored cookies.");
                if let Err(e) = self.cookies.load(&path) {
                    log::warn!("Couldn't load cookies from {}: {e}", path.display());
                }
            }
            Some(_) => log::debug!("No stored cookies, creating new."),
            None => log::debug!("Cannot load cookies - invalid data directory."),
        }

        if !self.cookies.contains(SESSION_COOKIE) {
            self.login_locked().await?;
        }

        *session = 1;
        Ok(*session)
    }

    async fn download(&self, url: &Url, auth: Auth, form: Option<&Form>) -> Result<String> {
        self.throttle.lock().await.wait().await;
        log::debug!("Fetching page '{url}'.");

        let client = match auth {
            Auth::Anonymous => &self.client,
            Auth::Session | Auth::SessionUnchecked => &self.session_client,
        };

        let mut attempt = 0;
        let page = loop {
            match self.send(client, url, form).await {
                Ok(page) => break page,
                Err(e) if e.is_transient() && attempt < self.config.retries => {
                    attempt += 1;
                    log::warn!(
                        "Download of '{url}' failed: {e}, retry {attempt}/{} in {:?}",
                        self.config.retries,
                        self.config.retry_delay()
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        };

        self.save_user_agent();
        if auth != Auth::Anonymous {
            self.save_cookies();
        }

        Ok(page)
    }

    async fn send(&self, client: &Client, url: &Url, form: Option<&Form>) -> Result<String> {
        let request = match form {
            Some(form) => client.post(url.clone()).form(form),
            None => client.get(url.clone()),
        };

        let resp = request
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, ACCEPT_VALUE)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .header(ACCEPT_CHARSET, ACCEPT_CHARSET_VALUE)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(resp.text().await?)
    }

    fn cookie_file(&self) -> Option<PathBuf> {
        self.user_file.as_deref().map(|f| with_suffix(f, ".cookie"))
    }

    fn save_cookies(&self) {
        if let Some(path) = self.cookie_file() {
            log::debug!("Saving cookies.");
            if let Err(e) = self.cookies.save(&path) {
                log::warn!("Couldn't save cookies to {}: {e}", path.display());
            }
        }
    }

    fn save_user_agent(&self) {
        if let Some(path) = self.user_file.as_deref().map(|f| with_suffix(f, ".ua")) {
            if let Err(e) = fs::write(&path, &self.user_agent) {
                log::warn!("Couldn't save user agent to {}: {e}", path.display());
            }
        }
    }
}

/// Whether a page was served to a logged in user.
pub fn check_login(page: &str) -> bool {
    !page.contains(NOT_LOGGED_IN)
}

/// Per-user base path: the username stripped of accents and unsafe characters,
/// then its hash.
pub fn user_file_name(data_dir: &Path, username: &str) -> PathBuf {
    let hash = format!("{:x}", Sha256::digest(username.as_bytes()));
    let name: String = username
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    data_dir.join(format!("{name}_{hash}"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

fn load_user_agent(user_file: &Path) -> Option<String> {
    let path = with_suffix(user_file, ".ua");
    let ua = fs::read_to_string(path).ok()?;
    let ua = ua.trim();
    (!ua.is_empty()).then(|| ua.to_string())
}

fn client_builder(config: &FetcherConfig) -> ClientBuilder {
    ClientBuilder::new()
        .gzip(true)
        .deflate(true)
        .timeout(config.timeout())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_file_name_is_ascii_safe() {
        let path = user_file_name(Path::new("/data"), "Petr Morávek");
        let name = path.file_name().unwrap().to_str().unwrap();
        let (prefix, hash) = name.split_once('_').unwrap();
        assert_eq!(prefix, "PetrMoravek");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn suffix_keeps_dots_in_name() {
        let path = with_suffix(Path::new("/data/john.doe_abc"), ".cookie");
        assert_eq!(path, Path::new("/data/john.doe_abc.cookie"));
    }

    #[test]
    fn not_logged_in_marker() {
        assert!(check_login("<html>Welcome back</html>"));
        assert!(!check_login("<p>You are not logged in.</p>"));
    }
}
