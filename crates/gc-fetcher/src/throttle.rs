use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep_until, Instant};

/// Spaces out requests to lessen the load on the site.
///
/// The minimal delay between two fetches grows with the number of pages
/// already fetched in this session.
#[derive(Debug)]
pub struct Throttle {
    enabled: bool,
    fetch_count: usize,
    last_fetch: Option<Instant>,
}

impl Throttle {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            fetch_count: 0,
            last_fetch: None,
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    /// Sleeps until the next fetch is allowed, then records it.
    pub async fn wait(&mut self) {
        if self.enabled {
            if let Some(last) = self.last_fetch {
                let delay = delay_after(self.fetch_count, &mut rand::thread_rng());
                log::trace!("Throttling fetch #{} by {delay:?}", self.fetch_count + 1);
                sleep_until(last + delay).await;
            }
        }
        self.fetch_count += 1;
        self.last_fetch = Some(Instant::now());
    }
}

/// Delay between the previous fetch and the next one.
pub fn delay_after<R: Rng + ?Sized>(fetch_count: usize, rng: &mut R) -> Duration {
    let secs = match fetch_count {
        // 60 fetches in the first minute
        0..=59 => 1,
        // 240 more in about 10 minutes
        60..=299 => rng.gen_range(1..=4),
        // 300 more in about 30 minutes
        300..=599 => rng.gen_range(2..=10),
        _ => rng.gen_range(10..=20),
    };
    Duration::from_secs(secs)
}
