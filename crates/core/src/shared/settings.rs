use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{MAX_BLUR_AMOUNT, MIN_BLUR_AMOUNT};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// Per-frame filter configuration: blur strength and the detail toggle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorSettings {
    pub blur_amount: f64,
    pub enhance_details: bool,
}

impl Default for AnnotatorSettings {
    fn default() -> Self {
        Self {
            blur_amount: MIN_BLUR_AMOUNT,
            enhance_details: false,
        }
    }
}

impl AnnotatorSettings {
    /// Builds settings with `blur_amount` clamped into the supported range.
    pub fn new(blur_amount: f64, enhance_details: bool) -> Self {
        Self {
            blur_amount: clamp_blur_amount(blur_amount),
            enhance_details,
        }
    }

    /// Returns a copy with the blur amount forced into range.
    pub fn clamped(self) -> Self {
        Self::new(self.blur_amount, self.enhance_details)
    }

    /// `<config_dir>/line-annotator/settings.json`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|d| d.join("line-annotator").join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(settings.clamped())
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)
    }
}

/// Clamps into [`MIN_BLUR_AMOUNT`, `MAX_BLUR_AMOUNT`]; non-finite input maps to the minimum.
pub fn clamp_blur_amount(amount: f64) -> f64 {
    if amount.is_finite() {
        amount.clamp(MIN_BLUR_AMOUNT, MAX_BLUR_AMOUNT)
    } else {
        MIN_BLUR_AMOUNT
    }
}

/// Live settings shared between a controller and the frame loop.
///
/// Each field is a single atomic, so readers never block; the frame loop
/// takes one [`snapshot`](Self::snapshot) per frame.
#[derive(Clone, Debug)]
pub struct SettingsHandle {
    blur_bits: Arc<AtomicU64>,
    enhance: Arc<AtomicBool>,
}

impl SettingsHandle {
    pub fn new(initial: AnnotatorSettings) -> Self {
        let initial = initial.clamped();
        Self {
            blur_bits: Arc::new(AtomicU64::new(initial.blur_amount.to_bits())),
            enhance: Arc::new(AtomicBool::new(initial.enhance_details)),
        }
    }

    pub fn snapshot(&self) -> AnnotatorSettings {
        AnnotatorSettings {
            blur_amount: f64::from_bits(self.blur_bits.load(Ordering::Relaxed)),
            enhance_details: self.enhance.load(Ordering::Relaxed),
        }
    }

    pub fn set_blur_amount(&self, amount: f64) {
        self.blur_bits
            .store(clamp_blur_amount(amount).to_bits(), Ordering::Relaxed);
    }

    pub fn set_enhance_details(&self, enabled: bool) {
        self.enhance.store(enabled, Ordering::Relaxed);
    }

    pub fn update(&self, settings: AnnotatorSettings) {
        self.set_blur_amount(settings.blur_amount);
        self.set_enhance_details(settings.enhance_details);
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(AnnotatorSettings::default())
    }
}
