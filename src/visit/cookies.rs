use crate::adapters::cookie_header;

/// Raw `name=value` cookies collected over a visit, in arrival order.
///
/// Entries are only ever appended; an identical entry is stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the exact entry was already present.
    pub fn add(&mut self, cookie: impl Into<String>) -> bool {
        let cookie = cookie.into();
        if self.cookies.contains(&cookie) {
            return false;
        }
        self.cookies.push(cookie);
        true
    }

    pub fn extend<I, S>(&mut self, iter: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for cookie in iter {
            self.add(cookie);
        }
    }

    pub fn contains(&self, cookie: &str) -> bool {
        self.cookies
            .iter()
            .any(|c| c == cookie)
    }

    /// Value of the most recent cookie called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .filter_map(|c| c.split_once('='))
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cookies
            .iter()
            .map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.cookies
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// The `HTTP_COOKIE` value for the next request.
    pub fn header(&self) -> String {
        cookie_header(&self.cookies)
    }
}
