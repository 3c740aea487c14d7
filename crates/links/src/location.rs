//! Hash-routed locations such as `/bafy...?m=...`.
//!
//! A location may be given as a full URL, as a `#...` fragment, or as the bare
//! route. Everything before the first `#` is ignored.

/// A parsed route: path plus optional query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    raw: &'a str,
    path: &'a str,
    query: Option<&'a str>,
}

impl<'a> Location<'a> {
    pub fn parse(input: &'a str) -> Self {
        let raw = match input.find('#') {
            Some(hash) => &input[hash + 1..],
            None => input,
        };
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (raw, None),
        };
        Self { raw, path, query }
    }

    /// The route with its query, without any `#`.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// The route without its query.
    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn query(&self) -> Option<&'a str> {
        self.query
    }

    /// Last `/`-separated segment of the path, if non-empty.
    pub fn token(&self) -> Option<&'a str> {
        let (_, token) = self.path.rsplit_once('/')?;
        (!token.is_empty()).then_some(token)
    }

    /// Raw (still percent-encoded) value of the first non-empty `key=` pair.
    pub fn param(&self, key: &str) -> Option<&'a str> {
        self.query?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, value)| *name == key && !value.is_empty())
            .map(|(_, value)| value)
    }

    /// True for the empty route and `/`.
    pub fn is_root(&self) -> bool {
        self.path.is_empty() || self.path == "/"
    }
}
