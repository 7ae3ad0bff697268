use crate::{
    data::{RequestData, ResponseEnvelope},
    error::Error,
    util,
};
use async_trait::async_trait;
use hyper::{body, client::HttpConnector, Body, Client, Request};
use hyper_tls::HttpsConnector;
use std::fmt::Debug;

/// One network round trip. Implementations must not retry.
#[async_trait]
pub trait HttpClient: Debug {
    async fn send(&self, request_data: &RequestData) -> Result<ResponseEnvelope, Error>;
}

#[derive(Debug, Clone)]
pub struct HyperHttpClient {
    client: Client<HttpsConnector<HttpConnector>>,
}

impl HyperHttpClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder().build(HttpsConnector::new()),
        }
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    async fn send(&self, request_data: &RequestData) -> Result<ResponseEnvelope, Error> {
        let mut request_builder = Request::builder()
            .uri(request_data.url.as_str())
            .method(request_data.method.as_str());

        if let Some(headers_mut) = request_builder.headers_mut() {
            util::put_headers(headers_mut, &request_data.headers)?;
        }

        let request: Request<Body> =
            request_builder.body(request_data.body.clone().unwrap_or_default().into())?;

        let response = self.client.request(request).await?;

        let status_code = response.status().as_u16();
        let headers = util::extract_headers(response.headers());
        let body = body::to_bytes(response.into_body()).await?;
        let body: String = String::from_utf8_lossy(&body).into();

        Ok(ResponseEnvelope {
            status_code,
            headers,
            body,
        })
    }
}

impl Default for HyperHttpClient {
    fn default() -> Self {
        Self::new()
    }
}
