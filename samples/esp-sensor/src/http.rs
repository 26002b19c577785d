use std::time::Duration;

use ambisense_api::firebase::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use embedded_svc::http::client::Client as HttpClient;
use embedded_svc::http::{Method, Status};
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

use crate::error::{AmbisenseError, Result};

const CHUNK_SIZE: usize = 512;

/// HTTPS over the ESP-IDF client, verified against the bundled CA certificates.
pub struct EspTransport {
    client: HttpClient<EspHttpConnection>,
}

impl EspTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_conf = HttpClientConfiguration {
            timeout: Some(timeout),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };

        Ok(Self {
            client: HttpClient::wrap(EspHttpConnection::new(&http_conf)?),
        })
    }
}

impl HttpTransport for EspTransport {
    type Error = AmbisenseError;

    fn send(&mut self, request: &HttpRequest<'_>) -> Result<HttpResponse> {
        let method = match request.method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Put => Method::Put,
            HttpMethod::Post => Method::Post,
        };

        let content_length = request.body.len().to_string();
        let mut headers = vec![("content-length", content_length.as_str())];
        if let Some(content_type) = request.content_type {
            headers.push(("content-type", content_type));
        }

        let mut outgoing = self.client.request(method, request.url, &headers)?;
        outgoing.write_all(request.body)?;
        outgoing.flush()?;

        let mut response = outgoing.submit()?;
        let status = response.status();

        let mut body = Vec::new();
        let mut chunk = [0_u8; CHUNK_SIZE];
        loop {
            let read = response.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Ok(HttpResponse { status, body })
    }
}
