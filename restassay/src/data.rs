use std::{collections::BTreeMap, fmt};

/// Header map with case-insensitive names. Names are stored lowercased.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S1: AsRef<str>, S2: Into<String>>(&mut self, name: S1, value: S2) {
        self.entries
            .insert(name.as_ref().to_lowercase(), value.into());
    }

    pub fn get<S: AsRef<str>>(&self, name: S) -> Option<&str> {
        self.entries
            .get(&name.as_ref().to_lowercase())
            .map(String::as_str)
    }

    pub fn contains<S: AsRef<str>>(&self, name: S) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> std::iter::FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// A fully resolved request, ready to be put on the wire.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RequestData {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
}

/// Status, headers and raw body of one HTTP response. Any status code is a valid envelope.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: Headers,
    pub body: String,
}

impl ResponseEnvelope {
    pub fn new<S: Into<String>>(status_code: u16, body: S) -> Self {
        Self {
            status_code,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_header<S1: AsRef<str>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl fmt::Display for ResponseEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status_code)?;
        if !self.body.is_empty() {
            write!(f, " {}", self.body)?;
        }
        Ok(())
    }
}
