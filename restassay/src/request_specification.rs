use crate::{data::Headers, error::Error};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContentType {
    Json,
    FormUrlEncoded,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

/// Immutable request template shared by every request derived from it.
#[derive(Debug, Clone)]
pub struct RequestSpecification {
    base_address: Url,
    content_type: ContentType,
    default_headers: Headers,
    default_query: Vec<(String, String)>,
}

impl RequestSpecification {
    pub fn builder() -> RequestSpecBuilder {
        RequestSpecBuilder::new()
    }

    pub fn base_address(&self) -> &Url {
        &self.base_address
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    pub fn default_query(&self) -> &[(String, String)] {
        &self.default_query
    }

    /// Joins `path` onto the base address, keeping any path prefix the base address carries.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_address.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Starts a builder pre-populated with this specification, for deriving a variant.
    pub fn to_builder(&self) -> RequestSpecBuilder {
        RequestSpecBuilder {
            base_address: Some(self.base_address.as_str().to_owned()),
            content_type: self.content_type,
            default_headers: self.default_headers.clone(),
            default_query: self.default_query.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestSpecBuilder {
    base_address: Option<String>,
    content_type: ContentType,
    default_headers: Headers,
    default_query: Vec<(String, String)>,
}

impl RequestSpecBuilder {
    pub fn new() -> Self {
        Self {
            base_address: None,
            content_type: ContentType::Json,
            default_headers: Headers::new(),
            default_query: Vec::new(),
        }
    }

    pub fn set_base_address<S: Into<String>>(mut self, base_address: S) -> Self {
        self.base_address = Some(base_address.into());
        self
    }

    pub fn set_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn add_header<S1: AsRef<str>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    pub fn add_query_param<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.default_query.push((name.into(), value.into()));
        self
    }

    /// Validates the base address and freezes the template.
    ///
    /// # Errors
    /// `Error::Configuration` when the base address is missing or is not an absolute URI.
    pub fn build(self) -> Result<Arc<RequestSpecification>, Error> {
        let base_address = self
            .base_address
            .ok_or_else(|| Error::Configuration("base address is not set".into()))?;
        let base_address = Url::parse(&base_address)?;

        if base_address.cannot_be_a_base() || !base_address.has_host() {
            return Err(Error::Configuration(format!(
                "base address {} is not an absolute URI",
                base_address
            )));
        }

        Ok(Arc::new(RequestSpecification {
            base_address,
            content_type: self.content_type,
            default_headers: self.default_headers,
            default_query: self.default_query,
        }))
    }
}

impl Default for RequestSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}
