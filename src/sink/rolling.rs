//! Rotating file sink.
//!
//! Rotation and pruning are done by `tracing_appender`'s rolling appender.
//! For a configured path `logs/app.log` the active segment is
//! `logs/app.<period>.log`, where `<period>` is the UTC date (daily) or
//! date and hour (hourly) the segment was opened in. The configured path
//! itself is kept as a symlink to the active segment.

use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use super::Sink;
use crate::error::{Error, Result};
use crate::pipeline::config::FileConfig;

/// Appends records to a time-rotated file.
pub struct RollingFileSink {
    config: FileConfig,
    naming: SegmentNaming,
    active: Mutex<Active>,
}

struct Active {
    appender: RollingFileAppender,
    /// Segment the link at the configured path currently points to.
    linked: Option<String>,
}

/// How the appender names its segments.
#[derive(Debug, Clone)]
struct SegmentNaming {
    rotation: Rotation,
    prefix: String,
    suffix: Option<String>,
}

impl SegmentNaming {
    /// File name of the segment that is active at `now`.
    fn segment_at(&self, now: DateTime<Utc>) -> String {
        let date = if self.rotation == Rotation::HOURLY {
            now.format("%Y-%m-%d-%H").to_string()
        } else if self.rotation == Rotation::DAILY {
            now.format("%Y-%m-%d").to_string()
        } else {
            return match &self.suffix {
                Some(suffix) => format!("{}.{}", self.prefix, suffix),
                None => self.prefix.clone(),
            };
        };
        match &self.suffix {
            Some(suffix) => format!("{}.{}.{}", self.prefix, date, suffix),
            None => format!("{}.{}", self.prefix, date),
        }
    }
}

impl RollingFileSink {
    /// Open (or create) the active segment for `config`.
    ///
    /// Fails if the path has no file name, the directory cannot be created,
    /// or the appender cannot open its first segment.
    pub fn open(config: &FileConfig) -> Result<Self> {
        let file_name = config
            .path
            .file_name()
            .map(Path::new)
            .ok_or_else(|| Error::InvalidPath(config.path.clone()))?;
        let directory = log_directory(&config.path);

        fs::create_dir_all(&directory).map_err(|source| Error::CreateDir {
            path: directory.clone(),
            source,
        })?;

        let naming = SegmentNaming {
            rotation: rotation_for(config.rotation_hours),
            prefix: file_name
                .file_stem()
                .unwrap_or(file_name.as_os_str())
                .to_string_lossy()
                .into_owned(),
            suffix: file_name
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned()),
        };

        let mut builder = RollingFileAppender::builder()
            .rotation(naming.rotation.clone())
            .filename_prefix(naming.prefix.clone());
        if let Some(suffix) = &naming.suffix {
            builder = builder.filename_suffix(suffix.clone());
        }
        if let Some(keep) = retained_segments(config.rotation_hours, config.max_files) {
            builder = builder.max_log_files(keep);
        }

        let appender = builder
            .build(&directory)
            .map_err(|source| Error::FileSink {
                path: config.path.clone(),
                source,
            })?;

        let sink = Self {
            config: config.clone(),
            naming,
            active: Mutex::new(Active {
                appender,
                linked: None,
            }),
        };
        if let Err(e) = sink.relink(&mut sink.active.lock()) {
            log::warn!(
                "FILE_SINK_LINK_FAILED path={} error={}",
                config.path.display(),
                e
            );
        }

        log::debug!(
            "FILE_SINK_OPENED path={} rotation_hours={} max_files={}",
            config.path.display(),
            config.rotation_hours,
            config.max_files
        );
        Ok(sink)
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Directory the segments are written to.
    pub fn directory(&self) -> PathBuf {
        log_directory(&self.config.path)
    }

    /// Path of the segment records are currently appended to.
    pub fn active_segment(&self) -> PathBuf {
        self.directory().join(self.naming.segment_at(Utc::now()))
    }

    /// Point the link at the configured path to the active segment, if the
    /// period changed since the last call.
    fn relink(&self, active: &mut Active) -> io::Result<()> {
        let segment = self.naming.segment_at(Utc::now());
        if active.linked.as_deref() == Some(segment.as_str()) {
            return Ok(());
        }
        active.linked = Some(segment.clone());

        // Without rotation the segment is the configured path itself.
        if self.config.path.file_name() == Some(OsStr::new(&segment)) {
            return Ok(());
        }
        point_link(&self.config.path, &segment)
    }
}

impl Sink for RollingFileSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut active = self.active.lock();
        active.appender.write_all(line)?;
        self.relink(&mut active)
    }

    fn flush(&self) -> io::Result<()> {
        self.active.lock().appender.flush()
    }
}

impl Drop for RollingFileSink {
    fn drop(&mut self) {
        let _ = self.active.get_mut().appender.flush();
    }
}

/// Rotation granularity for an interval in hours.
///
/// The rolling engine rotates on calendar boundaries only, so `0` disables
/// rotation, `1..=23` rotates hourly and anything from a day up rotates daily.
pub fn rotation_for(hours: u32) -> Rotation {
    match hours {
        0 => Rotation::NEVER,
        1..=23 => Rotation::HOURLY,
        _ => Rotation::DAILY,
    }
}

/// Number of segments to keep so that `max_files` intervals of
/// `rotation_hours` stay on disk once rounded to the rotation period.
///
/// `None` keeps everything: either `max_files` is `0` or nothing rotates.
pub fn retained_segments(rotation_hours: u32, max_files: usize) -> Option<usize> {
    let period_hours: usize = match rotation_hours {
        0 => return None,
        1..=23 => 1,
        _ => 24,
    };
    if max_files == 0 {
        return None;
    }
    let window = rotation_hours as usize * max_files;
    Some((window + period_hours - 1) / period_hours)
}

/// Replace the symlink at `link` with one pointing at `segment`, a file name
/// in the same directory. A regular file at `link` is left alone.
fn point_link(link: &Path, segment: &str) -> io::Result<()> {
    if let Ok(meta) = fs::symlink_metadata(link) {
        if !meta.file_type().is_symlink() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a symlink", link.display()),
            ));
        }
    }

    let staging = link.with_file_name(format!(
        ".{}.link",
        link.file_name().unwrap_or_default().to_string_lossy()
    ));
    let _ = fs::remove_file(&staging);
    symlink(segment, &staging)?;
    fs::rename(&staging, link)
}

#[cfg(unix)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &str, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks not supported"))
}

fn log_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
