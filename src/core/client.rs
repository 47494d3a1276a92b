//! Unprivileged client: opens the endpoint and issues the one supported request.

use std::io;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::dispatch::{ControlRequest, ControlStatus};
use crate::core::protocol;
use crate::core::thermal::TemperatureReading;
use crate::error::CpuTempError;
use crate::platform::elevation_hint;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to open device: Access denied. {}", elevation_hint())]
    AccessDenied { path: PathBuf },

    #[error("Failed to open device {path:?}: {source}. Is the cputemp service running?")]
    EndpointUnavailable { path: PathBuf, source: io::Error },

    #[error("Failed to open device {path:?}: {source}")]
    Connect { path: PathBuf, source: io::Error },

    #[error("Request failed: {0}")]
    Status(ControlStatus),

    #[error("Communication with the service failed: {0}")]
    Transport(#[from] CpuTempError),
}

/// Connects to `path`, issues `request` and returns the decoded temperature.
pub fn query(
    path: &Path,
    request: &ControlRequest,
) -> Result<TemperatureReading, ClientError> {
    let mut stream = UnixStream::connect(path).map_err(|source| match source.kind() {
        io::ErrorKind::PermissionDenied => ClientError::AccessDenied {
            path: path.to_path_buf(),
        },
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => {
            ClientError::EndpointUnavailable {
                path: path.to_path_buf(),
                source,
            }
        }
        _ => ClientError::Connect {
            path: path.to_path_buf(),
            source,
        },
    })?;

    protocol::write_request(&mut stream, request)?;
    let result = protocol::read_result(&mut stream)?;

    result
        .temperature()
        .ok_or(ClientError::Status(result.status()))
}

/// Issues the "get CPU temperature" request with a 4-byte output buffer.
pub fn query_temperature(path: &Path) -> Result<TemperatureReading, ClientError> {
    query(path, &ControlRequest::get_cpu_temp())
}
