//! Background texture loading.
//!
//! Decoding runs on its own thread; the result comes back through a
//! one-slot channel that the render loop polls once per frame. Once a load
//! is cancelled (explicitly or by dropping it) its result is never observed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("texture loader exited without a result")]
    Abandoned,

    #[error("failed to spawn texture loader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

type Job = Box<dyn FnOnce() -> Result<RgbaImage, TextureLoadError> + Send>;

/// What to load: a labelled decode job.
pub struct TextureRequest {
    label: String,
    job: Job,
}

impl TextureRequest {
    /// Reads and decodes an image file (format guessed from its contents).
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::from_fn(path.display().to_string(), move || {
            let bytes = std::fs::read(&path).map_err(|source| TextureLoadError::Io { path, source })?;
            Ok(image::load_from_memory(&bytes)?.to_rgba8())
        })
    }

    /// An already decoded image.
    pub fn image(label: impl Into<String>, image: RgbaImage) -> Self {
        Self::from_fn(label, move || Ok(image))
    }

    pub fn from_fn<F>(label: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() -> Result<RgbaImage, TextureLoadError> + Send + 'static,
    {
        Self {
            label: label.into(),
            job: Box::new(job),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for TextureRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureRequest").field("label", &self.label).finish_non_exhaustive()
    }
}

/// An in-flight load.
#[derive(Debug)]
pub struct TextureLoad {
    label: String,
    rx: Receiver<Result<RgbaImage, TextureLoadError>>,
    cancelled: Arc<AtomicBool>,
}

impl TextureLoad {
    pub fn spawn(request: TextureRequest) -> Result<Self, TextureLoadError> {
        let TextureRequest { label, job } = request;
        let (tx, rx) = mpsc::sync_channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&cancelled);
        let thread_label = label.clone();
        thread::Builder::new()
            .name("tumble-texture".into())
            .spawn(move || {
                let result = job();
                if flag.load(Ordering::Acquire) {
                    log::debug!("texture load `{thread_label}` finished after cancel; dropping result");
                    return;
                }
                // The receiver may already be gone.
                let _ = tx.send(result);
            })
            .map_err(TextureLoadError::Spawn)?;

        log::debug!("texture load `{label}` started");
        Ok(Self { label, rx, cancelled })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Non-blocking check for the result.
    ///
    /// Returns `None` while the load is pending or after it was cancelled.
    pub fn poll(&mut self) -> Option<Result<RgbaImage, TextureLoadError>> {
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(TextureLoadError::Abandoned)),
        }
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            log::debug!("texture load `{}` cancelled", self.label);
        }
    }

    #[cfg(test)]
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for TextureLoad {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::sync_channel;
    use std::time::{Duration, Instant};

    use super::*;

    fn wait(load: &mut TextureLoad) -> Result<RgbaImage, TextureLoadError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = load.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "texture load timed out");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn delivers_decoded_image() {
        let mut load = TextureLoad::spawn(TextureRequest::image("solid", RgbaImage::new(3, 2))).unwrap();
        let image = wait(&mut load).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
    }

    #[test]
    fn bundled_atlas_decodes() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/cube-atlas.png");
        let mut load = TextureLoad::spawn(TextureRequest::file(path)).unwrap();
        let image = wait(&mut load).unwrap();
        assert_eq!(image.dimensions(), (384, 256));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut load = TextureLoad::spawn(TextureRequest::file("/definitely/not/here.png")).unwrap();
        assert!(matches!(wait(&mut load), Err(TextureLoadError::Io { .. })));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let request = TextureRequest::from_fn("garbage", || {
            Ok(image::load_from_memory(b"not an image")?.to_rgba8())
        });
        let mut load = TextureLoad::spawn(request).unwrap();
        assert!(matches!(wait(&mut load), Err(TextureLoadError::Decode(_))));
    }

    #[test]
    fn cancelled_load_never_delivers() {
        let (release_tx, release_rx) = sync_channel::<()>(0);
        let request = TextureRequest::from_fn("gated", move || {
            let _ = release_rx.recv();
            Ok(RgbaImage::new(1, 1))
        });
        let mut load = TextureLoad::spawn(request).unwrap();
        assert!(load.poll().is_none());

        load.cancel();
        release_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(20));

        assert!(load.is_cancelled());
        assert!(load.poll().is_none());
    }

    #[test]
    fn panicking_job_is_abandoned() {
        let request = TextureRequest::from_fn("panics", || panic!("decoder blew up"));
        let mut load = TextureLoad::spawn(request).unwrap();
        assert!(matches!(wait(&mut load), Err(TextureLoadError::Abandoned)));
    }
}
