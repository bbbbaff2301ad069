//! Frame acquisition.
//!
//! Devices sit behind [`FrameSource`]. The crate ships
//! [`ImageSequenceSource`], which replays recorded frames from disk.

use std::fs;
use std::path::{Path, PathBuf};

use irtrack_core::GrayImage;

/// Frame owned by the caller once acquired.
pub type OwnedFrame = GrayImage;

const IMAGE_EXTENSIONS: &[&str] = &["png", "pgm", "bmp", "jpg", "jpeg", "tif", "tiff"];

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no image frames found in {0}")]
    Empty(PathBuf),
    #[error("{path} is {got:?}, expected {expected:?} like the first frame")]
    SizeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        got: (usize, usize),
    },
}

/// Producer of grayscale sensor frames.
pub trait FrameSource {
    /// Frame size as `(width, height)`.
    fn dimensions(&self) -> (usize, usize);

    /// Next frame, or `None` when no new frame is ready yet.
    fn next_frame(&mut self) -> Result<Option<OwnedFrame>, SourceError>;

    fn set_exposure(&mut self, exposure: u32);

    /// `true` once the source will never produce another frame.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Replays grayscale image files in lexical path order.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    looping: bool,
    dimensions: (usize, usize),
    exposure: Option<u32>,
}

impl ImageSequenceSource {
    /// All image files directly inside `dir`.
    pub fn open_dir(dir: impl AsRef<Path>, looping: bool) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SourceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(SourceError::Empty(dir.to_path_buf()));
        }
        Self::from_paths(paths, looping)
    }

    /// Replay `paths`, sorted. The first frame fixes the dimensions.
    pub fn from_paths(mut paths: Vec<PathBuf>, looping: bool) -> Result<Self, SourceError> {
        paths.sort();
        let Some(first) = paths.first() else {
            return Err(SourceError::Empty(PathBuf::new()));
        };
        let frame = load_gray(first)?;
        log::info!(
            "replaying {} frame(s) of {}x{}{}",
            paths.len(),
            frame.width,
            frame.height,
            if looping { ", looping" } else { "" }
        );
        Ok(Self {
            dimensions: (frame.width, frame.height),
            paths,
            next: 0,
            looping,
            exposure: None,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Last exposure requested by the session; recorded frames ignore it.
    pub fn exposure(&self) -> Option<u32> {
        self.exposure
    }
}

impl FrameSource for ImageSequenceSource {
    fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    fn next_frame(&mut self) -> Result<Option<OwnedFrame>, SourceError> {
        if self.next >= self.paths.len() {
            if !self.looping {
                return Ok(None);
            }
            self.next = 0;
        }
        let path = &self.paths[self.next];
        self.next += 1;

        let frame = load_gray(path)?;
        let got = (frame.width, frame.height);
        if got != self.dimensions {
            return Err(SourceError::SizeMismatch {
                path: path.clone(),
                expected: self.dimensions,
                got,
            });
        }
        Ok(Some(frame))
    }

    fn set_exposure(&mut self, exposure: u32) {
        log::debug!("exposure {exposure} has no effect on recorded frames");
        self.exposure = Some(exposure);
    }

    fn is_finished(&self) -> bool {
        !self.looping && self.next >= self.paths.len()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Decode any supported image file into an 8-bit grayscale frame.
pub fn load_gray(path: &Path) -> Result<OwnedFrame, SourceError> {
    let img = image::open(path)
        .map_err(|source| SourceError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_luma8();
    Ok(GrayImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.into_raw(),
    })
}
