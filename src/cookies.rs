use cookie::Cookie;
use reqwest::Url;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use std::{fs, io};

#[derive(Debug, thiserror::Error)]
pub enum CookieCacheError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid cookie cache: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    /// Set when the server gave no `Domain` attribute; only the exact host matches.
    pub host_only: bool,
    pub path: String,
    pub secure: bool,
}

impl StoredCookie {
    fn from_set_cookie(header: &str, url: &Url) -> Option<(Self, bool)> {
        let parsed = Cookie::parse(header).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();

        let (domain, host_only) = match parsed.domain() {
            Some(domain) => (domain.trim_start_matches('.').to_ascii_lowercase(), false),
            None => (host.clone(), true),
        };
        if !domain_matches(&host, &domain) {
            log::debug!("Rejected cookie {} for foreign domain {}", parsed.name(), domain);
            return None;
        }

        let path = match parsed.path() {
            Some(path) if path.starts_with('/') => path.to_string(),
            _ => default_path(url),
        };

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        let removed = parsed.max_age().is_some_and(|age| age.whole_seconds() <= 0)
            || parsed
                .expires_datetime()
                .is_some_and(|at| at.unix_timestamp() <= now);

        let cookie = StoredCookie {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            host_only,
            path,
            secure: parsed.secure().unwrap_or(false),
        };
        Some((cookie, removed))
    }

    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let host_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(&host, &self.domain)
        };

        host_ok && path_matches(url.path(), &self.path) && (!self.secure || url.scheme() == "https")
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    request_path == cookie_path
        || (request_path.starts_with(cookie_path)
            && (cookie_path.ends_with('/')
                || request_path[cookie_path.len()..].starts_with('/')))
}

fn default_path(url: &Url) -> String {
    match url.path().rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => url.path()[..idx].to_string(),
    }
}

/// Cookie jar shared with the HTTP client.
///
/// Holds every cookie the portal has set during this process and can be
/// written to, or restored from, a JSON cache file.
#[derive(Debug, Default)]
pub struct SessionCookies {
    cookies: RwLock<Vec<StoredCookie>>,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<StoredCookie> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, cookies: Vec<StoredCookie>) {
        *self.cookies.write().unwrap_or_else(PoisonError::into_inner) = cookies;
    }

    pub fn len(&self) -> usize {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.clone())
    }

    pub fn load(&self, path: &Path) -> Result<(), CookieCacheError> {
        let contents = fs::read_to_string(path)?;
        let cookies: Vec<StoredCookie> = serde_json::from_str(&contents)?;
        self.replace(cookies);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), CookieCacheError> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl reqwest::cookie::CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);

        for header in cookie_headers {
            let Ok(header) = header.to_str() else {
                continue;
            };
            let Some((cookie, removed)) = StoredCookie::from_set_cookie(header, url) else {
                continue;
            };

            cookies.retain(|c| !c.same_slot(&cookie));
            if removed {
                log::trace!("Cookie {} removed by {}", cookie.name, url);
            } else {
                log::trace!("Cookie {} set by {}", cookie.name, url);
                cookies.push(cookie);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.matches(url))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}
