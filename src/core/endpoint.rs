//! Privileged endpoint lifecycle.
//!
//! The endpoint is a Unix socket at a private path plus a symlink alias that
//! clients use to find it. Both are created by [`Endpoint::create`] and removed
//! when the [`Endpoint`] is dropped.

use std::fs;
use std::io::{self, BufReader, BufWriter, Read};
use std::os::unix::fs::{symlink, DirBuilderExt, FileTypeExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::config::Config;
use crate::core::dispatch::Dispatcher;
use crate::core::protocol;
use crate::error::{CpuTempError, Result};

/// How long a client has to deliver a complete request frame.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(5);

/// Paths and permissions of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub path: PathBuf,
    /// Symlink pointing at `path`; `None` to skip the alias
    pub alias: Option<PathBuf>,
    pub mode: u32,
}

impl From<&Config> for EndpointConfig {
    fn from(config: &Config) -> Self {
        let alias = (!config.alias_path.as_os_str().is_empty()
            && config.alias_path != config.endpoint_path)
            .then(|| config.alias_path.clone());
        Self {
            path: config.endpoint_path.clone(),
            alias,
            mode: config.socket_mode,
        }
    }
}

/// Stops a running [`Endpoint::serve`] loop from another thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    path: PathBuf,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // wake the blocking accept
        let _ = UnixStream::connect(&self.path);
    }
}

#[derive(Debug)]
pub struct Endpoint {
    listener: UnixListener,
    path: PathBuf,
    alias: Option<PathBuf>,
    shutdown: Arc<AtomicBool>,
}

impl Endpoint {
    pub fn create(config: &EndpointConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        remove_stale_socket(&config.path)?;

        let listener = bind_with_mode(&config.path, config.mode)?;

        if let Some(alias) = &config.alias {
            if let Err(e) = create_alias(alias, &config.path) {
                let _ = fs::remove_file(&config.path);
                return Err(CpuTempError::endpoint(format!(
                    "cannot create alias {:?}: {}",
                    alias, e
                )));
            }
        }

        log::info!(
            "Endpoint listening on {:?}{}",
            config.path,
            config
                .alias
                .as_ref()
                .map(|a| format!(" (alias {:?})", a))
                .unwrap_or_default()
        );

        Ok(Self {
            listener,
            path: config.path.clone(),
            alias: config.alias.clone(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn alias(&self) -> Option<&Path> {
        self.alias.as_deref()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            path: self.path.clone(),
        }
    }

    /// Serves each connection on its own thread until shut down.
    ///
    /// Returns once the accept loop has stopped and every open connection has
    /// finished or run out its request deadline.
    pub fn serve(&self, dispatcher: &Dispatcher) -> Result<()> {
        thread::scope(|scope| {
            for stream in self.listener.incoming() {
                if self.shutdown.load(Ordering::SeqCst) {
                    break;
                }

                match stream {
                    Ok(stream) => {
                        scope.spawn(move || {
                            if let Err(e) = handle_connection(stream, dispatcher) {
                                log::warn!("Dropping connection: {}", e);
                            }
                        });
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => log::warn!("Accept failed: {}", e),
                }
            }
        });

        log::info!("Endpoint on {:?} shutting down", self.path);
        Ok(())
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        if let Some(alias) = &self.alias {
            if let Err(e) = fs::remove_file(alias) {
                log::debug!("Removing alias {:?}: {}", alias, e);
            }
        }
        if let Err(e) = fs::remove_file(&self.path) {
            log::debug!("Removing endpoint {:?}: {}", self.path, e);
        }
    }
}

/// Answers each request on the stream until the client closes it.
fn handle_connection(stream: UnixStream, dispatcher: &Dispatcher) -> Result<()> {
    let mut reader = BufReader::new(DeadlineReader::new(stream.try_clone()?));
    let mut writer = BufWriter::new(stream);

    loop {
        reader.get_mut().restart(REQUEST_DEADLINE);
        let Some(request) = protocol::read_request(&mut reader)? else {
            break;
        };
        let result = dispatcher.handle(&request);
        log::debug!("{:?} -> {:?}", request, result);
        protocol::write_result(&mut writer, &result)?;
    }
    Ok(())
}

/// Socket reader that fails once an overall deadline passes, however the
/// bytes trickle in.
struct DeadlineReader {
    stream: UnixStream,
    deadline: Instant,
}

impl DeadlineReader {
    fn new(stream: UnixStream) -> Self {
        Self {
            stream,
            deadline: Instant::now() + REQUEST_DEADLINE,
        }
    }

    fn restart(&mut self, budget: Duration) {
        self.deadline = Instant::now() + budget;
    }
}

impl Read for DeadlineReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "request not completed before the deadline",
            ));
        }
        self.stream.set_read_timeout(Some(remaining))?;
        self.stream.read(buf)
    }
}

/// Binds `path` without it ever being reachable under looser permissions than
/// `mode`: the socket is created in a private 0700 directory next to `path`,
/// chmodded, then renamed into place.
fn bind_with_mode(path: &Path, mode: u32) -> Result<UnixListener> {
    let name = path
        .file_name()
        .ok_or_else(|| CpuTempError::endpoint(format!("{:?} has no file name", path)))?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let mut staging_name = std::ffi::OsString::from(".");
    staging_name.push(name);
    staging_name.push(format!(".{}", std::process::id()));
    let staging = parent.join(staging_name);

    fs::DirBuilder::new().mode(0o700).create(&staging)?;
    let staged = staging.join(name);

    let bound = UnixListener::bind(&staged)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                CpuTempError::permission_denied(format!("cannot bind {:?}", path))
            } else {
                CpuTempError::endpoint(format!("cannot bind {:?}: {}", path, e))
            }
        })
        .and_then(|listener| {
            fs::set_permissions(&staged, fs::Permissions::from_mode(mode))?;
            fs::rename(&staged, path)?;
            Ok(listener)
        });

    if bound.is_err() {
        let _ = fs::remove_file(&staged);
    }
    if let Err(e) = fs::remove_dir(&staging) {
        log::debug!("Removing staging directory {:?}: {}", staging, e);
    }
    bound
}

fn remove_stale_socket(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            if UnixStream::connect(path).is_ok() {
                return Err(CpuTempError::endpoint(format!(
                    "{:?} is already in use by a running service",
                    path
                )));
            }
            log::debug!("Removing stale socket {:?}", path);
            fs::remove_file(path)?;
            Ok(())
        }
        Ok(_) => Err(CpuTempError::endpoint(format!(
            "{:?} exists and is not a socket",
            path
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn create_alias(alias: &Path, target: &Path) -> io::Result<()> {
    // an alias left over from an unclean stop is replaced; anything else is not
    if let Ok(meta) = fs::symlink_metadata(alias) {
        if !meta.file_type().is_symlink() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "path exists and is not a symlink",
            ));
        }
        fs::remove_file(alias)?;
    }
    if let Some(parent) = alias.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    symlink(target, alias)
}
