//! Cookie jar parsed from a `Cookie` request header.

use std::collections::HashMap;
use std::sync::RwLock;
use storefront_types::CookieSource;

/// An in-memory cookie jar.
///
/// Values are kept verbatim (no percent-decoding). A name that appears more
/// than once in the parsed header is ambiguous and resolves to no value.
#[derive(Default)]
pub struct CookieJar {
    cookies: RwLock<HashMap<String, Option<String>>>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a header such as `"theme=dark; access_token=abc123"`.
    ///
    /// Pairs without `=` are ignored.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut cookies: HashMap<String, Option<String>> = HashMap::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies
                .entry(name.to_string())
                .and_modify(|v| *v = None)
                .or_insert_with(|| Some(value.trim().to_string()));
        }
        Self {
            cookies: RwLock::new(cookies),
        }
    }

    /// Set or replace a cookie.
    pub fn set(&self, name: &str, value: &str) {
        if let Ok(mut cookies) = self.cookies.write() {
            cookies.insert(name.to_string(), Some(value.to_string()));
        }
    }

    pub fn remove(&self, name: &str) {
        if let Ok(mut cookies) = self.cookies.write() {
            cookies.remove(name);
        }
    }
}

impl CookieSource for CookieJar {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .ok()
            .and_then(|cookies| cookies.get(name).cloned().flatten())
    }
}
