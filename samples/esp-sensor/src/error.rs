use esp_idf_svc::io::EspIOError;
use esp_idf_svc::sys::EspError;

#[derive(thiserror::Error, Debug)]
pub enum AmbisenseError {
    #[error("WiFi connection failed: {0}")]
    WifiConnection(String),

    #[error("Sensor error: {0}")]
    Sensor(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Startup failed: {0}")]
    Startup(#[from] ambisense_embedded::Error),

    #[error("System error: {0}")]
    System(String),
}

impl From<EspError> for AmbisenseError {
    fn from(err: EspError) -> Self {
        AmbisenseError::System(format!("ESP error: {}", err))
    }
}

impl From<EspIOError> for AmbisenseError {
    fn from(err: EspIOError) -> Self {
        AmbisenseError::Http(format!("{}", err))
    }
}

pub type Result<T> = core::result::Result<T, AmbisenseError>;
