use std::time::Duration;

use ambisense_api::firebase::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

/// Blocking HTTPS transport for the host simulator.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    type Error = reqwest::Error;

    fn send(&mut self, request: &HttpRequest<'_>) -> Result<HttpResponse, Self::Error> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(request.url),
            HttpMethod::Put => self.client.put(request.url),
            HttpMethod::Post => self.client.post(request.url),
        };

        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.to_vec());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();

        tracing::trace!("{} {} -> {}", request.method, redact(request.url), status);

        Ok(HttpResponse { status, body })
    }
}

/// Drops the query string, which carries the API key or the ID token.
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
