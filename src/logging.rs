use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Stdout logging, plus a size-capped file when `log_file` is given.
pub fn init_logging(log_level: Level, log_file: Option<&str>) {
    let level_filter = LevelFilter::from_level(log_level);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_filter(level_filter);

    let file_layer = log_file.map(|path| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(make_capped_file_writer(PathBuf::from(path), MAX_LOG_FILE_BYTES))
            .with_filter(level_filter)
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

fn make_capped_file_writer(path: PathBuf, max_len: u64) -> impl Fn() -> CappedFileWriter + Send + Sync + 'static {
    let lock = Arc::new(Mutex::new(()));
    move || CappedFileWriter { path: path.clone(), max_len, lock: lock.clone() }
}

/// Appends to `path`; once the file reaches `max_len` it is cut down to its
/// newest half before the next write.
struct CappedFileWriter {
    path: PathBuf,
    max_len: u64,
    lock: Arc<Mutex<()>>,
}

impl CappedFileWriter {
    fn keep_tail(&self) -> io::Result<()> {
        let keep_bytes = self.max_len / 2;
        let mut tail = Vec::new();
        {
            let mut rf = OpenOptions::new().read(true).open(&self.path)?;
            let size = rf.metadata()?.len();
            rf.seek(SeekFrom::Start(size.saturating_sub(keep_bytes)))?;
            rf.read_to_end(&mut tail)?;
        }
        let mut wf = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        wf.write_all(&tail)
    }
}

impl Write for CappedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A panic in another writer must not silence logging for good
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let over_cap = std::fs::metadata(&self.path).is_ok_and(|m| m.len() >= self.max_len);
        if over_cap {
            self.keep_tail()?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.log");
        let make = make_capped_file_writer(path.clone(), 1024);

        make().write_all(b"first\n").unwrap();
        make().write_all(b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_writer_keeps_newest_half_when_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.log");
        std::fs::write(&path, "a".repeat(60) + &"b".repeat(40)).unwrap();
        let make = make_capped_file_writer(path.clone(), 100);

        make().write_all(b"new").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a".repeat(10) + &"b".repeat(40) + "new");
    }
}
