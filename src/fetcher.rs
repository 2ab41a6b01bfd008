use crate::errors::{Error, Result};
use reqwest::blocking::Client;

/// Retrieves the bytes behind a URL.
///
/// Implementations must fail on transport errors and on any non-success
/// response status. No retries are attempted.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// A blocking HTTP(S) fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Creates a fetcher with a default client. No request timeout is set.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let transport = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().map_err(transport)?;
        Ok(body.to_vec())
    }
}
