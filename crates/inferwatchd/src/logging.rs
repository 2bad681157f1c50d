//! Tracing setup: a console layer plus a JSON file layer with size-based
//! rotation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use inferwatch_core::config::LoggingConfig;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG` overrides `log_level` when set.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let file = RotatingFile::open(
        &config.log_file,
        config.max_log_size_mb * BYTES_PER_MB,
        config.backup_count,
    )
    .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(
            fmt::layer()
                .with_ansi(config.console_colors)
                .with_target(false),
        )
        .with(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

/// Console-only setup for commands that never start monitoring.
pub fn init_console() {
    let _ = tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_target(false))
        .try_init();
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_ascii_lowercase()))
}

/// Append-only log file that rolls over once it would exceed `max_bytes`.
///
/// On rollover `log` becomes `log.1`, `log.1` becomes `log.2` and so on;
/// anything past `backups` is deleted. With zero backups the file is
/// truncated instead. A `max_bytes` of zero disables rotation.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: u32,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: &Path, max_bytes: u64, backups: u32) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = append(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file,
            written,
        })
    }

    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups == 0 {
            self.file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(&self.path)?;
        } else {
            let oldest = self.backup_path(self.backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.backups).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = append(&self.path)?;
        }
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_bytes > 0
            && self.written > 0
            && self.written + buf.len() as u64 > self.max_bytes
        {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("monitoring.log");
        let mut file = RotatingFile::open(&path, 1024, 2).unwrap();
        file.write_all(b"hello\n").unwrap();
        assert_eq!(read(&path), "hello\n");
    }

    #[test]
    fn rotates_when_limit_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitoring.log");
        let mut file = RotatingFile::open(&path, 10, 2).unwrap();

        file.write_all(b"aaaaaaaa\n").unwrap(); // 9 bytes
        file.write_all(b"bbbbbbbb\n").unwrap(); // would be 18, rotates first

        assert_eq!(read(&path), "bbbbbbbb\n");
        assert_eq!(read(&file.backup_path(1)), "aaaaaaaa\n");
        assert!(!file.backup_path(2).exists());
    }

    #[test]
    fn keeps_at_most_backup_count_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitoring.log");
        let mut file = RotatingFile::open(&path, 4, 2).unwrap();

        for line in [b"1111", b"2222", b"3333", b"4444"] {
            file.write_all(line).unwrap();
        }

        assert_eq!(read(&path), "4444");
        assert_eq!(read(&file.backup_path(1)), "3333");
        assert_eq!(read(&file.backup_path(2)), "2222");
        assert!(!file.backup_path(3).exists());
    }

    #[test]
    fn zero_backups_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitoring.log");
        let mut file = RotatingFile::open(&path, 4, 0).unwrap();

        file.write_all(b"1111").unwrap();
        file.write_all(b"2222").unwrap();

        assert_eq!(read(&path), "2222");
        assert!(!file.backup_path(1).exists());
    }

    #[test]
    fn existing_size_counts_toward_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitoring.log");
        fs::write(&path, "old-content\n").unwrap();

        let mut file = RotatingFile::open(&path, 16, 1).unwrap();
        file.write_all(b"new-content\n").unwrap();

        assert_eq!(read(&path), "new-content\n");
        assert_eq!(read(&file.backup_path(1)), "old-content\n");
    }

    #[test]
    fn oversized_write_lands_in_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitoring.log");
        let mut file = RotatingFile::open(&path, 4, 1).unwrap();

        file.write_all(b"0123456789").unwrap();
        assert_eq!(read(&path), "0123456789");
        assert!(!file.backup_path(1).exists());
    }

    #[test]
    fn zero_limit_never_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitoring.log");
        let mut file = RotatingFile::open(&path, 0, 3).unwrap();
        for _ in 0..10 {
            file.write_all(b"line\n").unwrap();
        }
        assert_eq!(read(&path).lines().count(), 10);
        assert!(!file.backup_path(1).exists());
    }
}
