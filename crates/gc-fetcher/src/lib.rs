mod config;
mod cookies;
mod error;
mod fetcher;
mod form;
mod throttle;
mod user_agent;

pub use config::{expand_home, FetcherConfig};
pub use cookies::CookieJar;
pub use error::{Error, Result};
pub use fetcher::{check_login, user_file_name, Auth, Fetcher, SESSION_COOKIE};
pub use form::{hidden_inputs, set_field, Form};
pub use throttle::{delay_after, Throttle};
pub use user_agent::random_user_agent;

pub use reqwest::Url;
