use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use validator::{Validate, ValidateError};

#[derive(Debug, Deserialize)]
pub struct Http {
    /// Address the HTTP server binds on.
    ///
    /// **Environment variables**:
    /// - `HUDDLE_HTTP_IP`
    #[serde(default = "Http::default_ip")]
    pub ip: IpAddr,
    /// Port the HTTP server binds on.
    ///
    /// **Environment variables**:
    /// - `HUDDLE_HTTP_PORT`
    #[serde(default = "Http::default_port")]
    pub port: u16,
    /// Amount of actix worker threads serving requests.
    ///
    /// **Environment variables**:
    /// - `HUDDLE_HTTP_WORKERS`
    #[serde(default = "Http::default_workers")]
    pub workers: usize,
}

impl Http {
    const DEFAULT_PORT: u16 = 8080;

    fn default_ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    const fn default_port() -> u16 {
        Self::DEFAULT_PORT
    }

    fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
    }
}

impl Default for Http {
    fn default() -> Self {
        Self {
            ip: Self::default_ip(),
            port: Self::default_port(),
            workers: Self::default_workers(),
        }
    }
}

impl Validate for Http {
    fn validate(&self) -> Result<(), ValidateError> {
        let mut fields = ValidateError::field_builder();
        fields.insert("workers", {
            let mut error = ValidateError::msg_builder();
            if self.workers == 0 {
                error.insert("Worker amount must not be zero");
            }
            error.build()
        });
        fields.build().into_result()
    }
}
