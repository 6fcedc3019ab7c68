use parking_lot::Mutex;
use reqwest::{header, Client};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::{sleep, Instant};
use url::Url;

/// Rules of the `User-agent: *` group of a robots.txt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsRules {
    pub allows: Vec<String>,
    pub disallows: Vec<String>,
    pub crawl_delay_ms: Option<u64>,
}

impl RobotsRules {
    pub fn parse(txt: &str) -> Self {
        let mut active = false;
        let mut rules = Self::default();
        for line in txt.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else { continue };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => active = value == "*",
                "allow" if active && !value.is_empty() => rules.allows.push(value.to_string()),
                "disallow" if active && !value.is_empty() => rules.disallows.push(value.to_string()),
                "crawl-delay" if active => {
                    if let Ok(secs) = value.parse::<f64>() {
                        rules.crawl_delay_ms = Some((secs * 1000.0) as u64);
                    }
                }
                _ => {}
            }
        }
        rules
    }

    /// Longest matching prefix wins; Allow wins a tie.
    pub fn allows(&self, path: &str) -> bool {
        let longest = |prefixes: &[String]| prefixes.iter().filter(|p| path.starts_with(p.as_str())).map(String::len).max();
        match (longest(&self.allows), longest(&self.disallows)) {
            (Some(a), Some(d)) => a >= d,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }
}

/// Per-host robots.txt rules and request pacing.
///
/// Rules are fetched once per host; concurrent tasks for a host wait on the
/// same fetch. Requests to one host are spaced by its crawl-delay.
#[derive(Clone, Default)]
pub struct RobotsCache {
    hosts: Arc<Mutex<HashMap<String, Arc<HostState>>>>,
}

#[derive(Default)]
struct HostState {
    rules: OnceCell<RobotsRules>,
    /// Earliest instant the next request to this host may start.
    next_slot: Mutex<Option<Instant>>,
}

impl RobotsCache {
    pub async fn rules_for(&self, client: &Client, url: &Url) -> Option<RobotsRules> {
        let host = url.host_str()?;
        let robots_url = format!("{}://{}/robots.txt", url.scheme(), host);
        let rules = self
            .rules_or_fetch(host, || async move {
                // an unreachable robots.txt means no restrictions
                let txt = match client.get(&robots_url).header(header::ACCEPT, "text/plain").send().await {
                    Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
                    _ => String::new(),
                };
                RobotsRules::parse(&txt)
            })
            .await;
        Some(rules)
    }

    /// Sleep until this request's turn for `url`'s host, `delay` after the previous one.
    pub async fn wait_turn(&self, url: &Url, delay: Duration) {
        let Some(host) = url.host_str() else { return };
        let state = self.host(host);
        let wait = {
            let mut next_slot = state.next_slot.lock();
            reserve_slot(&mut next_slot, Instant::now(), delay)
        };
        if !wait.is_zero() {
            tracing::debug!(host, wait_ms = wait.as_millis() as u64, "crawl-delay");
            sleep(wait).await;
        }
    }

    async fn rules_or_fetch<F, Fut>(&self, host: &str, fetch: F) -> RobotsRules
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RobotsRules>,
    {
        let state = self.host(host);
        state.rules.get_or_init(fetch).await.clone()
    }

    fn host(&self, host: &str) -> Arc<HostState> {
        self.hosts.lock().entry(host.to_string()).or_default().clone()
    }
}

/// Claim the next free slot after `now` and push the following one `delay`
/// later. Returns how long to wait for the claimed slot.
fn reserve_slot(next_slot: &mut Option<Instant>, now: Instant, delay: Duration) -> Duration {
    let start = next_slot.map_or(now, |slot| slot.max(now));
    *next_slot = Some(start + delay);
    start.duration_since(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ROBOTS: &str = "\
User-agent: googlebot
Disallow: /

User-agent: *
Disallow: /private
Allow: /private/press # public
Crawl-delay: 1.5
";

    #[test]
    fn parses_wildcard_group_only() {
        let rules = RobotsRules::parse(ROBOTS);
        assert_eq!(rules.disallows, vec!["/private"]);
        assert_eq!(rules.allows, vec!["/private/press"]);
        assert_eq!(rules.crawl_delay_ms, Some(1500));
    }

    #[test]
    fn longest_prefix_decides() {
        let rules = RobotsRules::parse(ROBOTS);
        assert!(rules.allows("/news"));
        assert!(!rules.allows("/private/files"));
        assert!(rules.allows("/private/press/2024"));
    }

    #[test]
    fn empty_disallow_allows_everything() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow:\n");
        assert!(rules.allows("/anything"));
    }

    #[test]
    fn slots_are_spaced_by_the_delay() {
        let now = Instant::now();
        let delay = Duration::from_millis(1500);
        let mut next = None;
        assert_eq!(reserve_slot(&mut next, now, delay), Duration::ZERO);
        assert_eq!(reserve_slot(&mut next, now, delay), delay);
        assert_eq!(reserve_slot(&mut next, now, delay), delay * 2);
    }

    #[test]
    fn idle_host_goes_immediately() {
        let start = Instant::now();
        let delay = Duration::from_millis(500);
        let mut next = None;
        reserve_slot(&mut next, start, delay);
        let later = start + Duration::from_secs(2);
        assert_eq!(reserve_slot(&mut next, later, delay), Duration::ZERO);
        assert_eq!(next, Some(later + delay));
    }

    #[test]
    fn zero_delay_never_waits() {
        let now = Instant::now();
        let mut next = None;
        for _ in 0..3 {
            assert_eq!(reserve_slot(&mut next, now, Duration::ZERO), Duration::ZERO);
        }
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_fetch() {
        let cache = RobotsCache::default();
        let counter = AtomicUsize::new(0);
        let fetches = &counter;
        let fetch = || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            RobotsRules::parse(ROBOTS)
        };
        let (a, b) = tokio::join!(
            cache.rules_or_fetch("example.com", fetch),
            cache.rules_or_fetch("example.com", fetch),
        );
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(a, b);
        assert_eq!(a.crawl_delay_ms, Some(1500));

        cache.rules_or_fetch("other.example", fetch).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
