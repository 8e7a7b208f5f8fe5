#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP response code {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
