use restassay::{ContentType, Error, RequestSpecBuilder, RequestSpecification};
use std::sync::Arc;

pub const DEFAULT_BASE_ADDRESS: &str = "https://petstore.swagger.io/v2";

const DEFAULT_API_KEY: &str = "special-key";

/// Builder used to build a PetstoreSpecs instance
#[derive(Debug, Clone, Default)]
pub struct PetstoreSpecsBuilder {
    base_address: Option<String>,
    api_key: Option<String>,
}

impl PetstoreSpecsBuilder {
    /// Create a new PetstoreSpecsBuilder instance.
    pub fn new() -> Self {
        Self {
            base_address: None,
            api_key: None,
        }
    }

    /// Use the given base address when building a PetstoreSpecs instance.
    ///
    /// # Arguments
    /// `base_address` - an absolute address every request path is appended to.
    ///
    /// # Returns
    /// This builder.
    pub fn with_base_address<T: Into<String>>(mut self, base_address: T) -> Self {
        self.base_address = Some(base_address.into());
        self
    }

    /// Use the given key for requests the service guards with an `api_key` header.
    ///
    /// # Arguments
    /// `api_key` - the key to send.
    ///
    /// # Returns
    /// This builder.
    pub fn with_api_key<T: Into<String>>(mut self, api_key: T) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Consume the builder and create a PetstoreSpecs instance using all of the previously configured values or
    /// their defaults.
    ///
    /// # Returns
    /// A PetstoreSpecs instance, or a configuration error when the base address is not absolute.
    pub fn build(mut self) -> Result<PetstoreSpecs, Error> {
        let base_address = self
            .base_address
            .take()
            .unwrap_or_else(|| String::from(DEFAULT_BASE_ADDRESS));

        let json = RequestSpecBuilder::new()
            .set_base_address(base_address)
            .set_content_type(ContentType::Json)
            .build()?;

        let form = json
            .to_builder()
            .set_content_type(ContentType::FormUrlEncoded)
            .build()?;

        Ok(PetstoreSpecs {
            json,
            form,
            api_key: self
                .api_key
                .take()
                .unwrap_or_else(|| String::from(DEFAULT_API_KEY)),
        })
    }
}

/// The request specifications of one test session against a pet store.
#[derive(Debug, Clone)]
pub struct PetstoreSpecs {
    json: Arc<RequestSpecification>,
    form: Arc<RequestSpecification>,
    api_key: String,
}

impl PetstoreSpecs {
    /// Create PetstoreSpecs for the service at `base_address` with the default api key.
    pub fn new<T: Into<String>>(base_address: T) -> Result<Self, Error> {
        PetstoreSpecsBuilder::new()
            .with_base_address(base_address)
            .build()
    }

    pub fn json(&self) -> &Arc<RequestSpecification> {
        &self.json
    }

    /// Same base address, form-encoded bodies.
    pub fn form(&self) -> &Arc<RequestSpecification> {
        &self.form
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}
