//! Replay configuration.
//!
//! Defaults follow the EuRoC layout. An optional JSON file named by
//! `STEREO_REPLAY_CONFIG` overrides them, individual `STEREO_REPLAY_*`
//! variables override the file, and the result is validated once.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::DEFAULT_IMAGE_EXTENSION;
use crate::error::ReplayError;

const DEFAULT_LEFT_SUBDIR: &str = "mav0/cam0/data";
const DEFAULT_RIGHT_SUBDIR: &str = "mav0/cam1/data";

#[derive(Debug, Deserialize, Default)]
struct ReplayConfigFile {
    cameras: Option<CamerasConfigFile>,
    image_extension: Option<String>,
    timing: Option<TimingConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CamerasConfigFile {
    left_subdir: Option<PathBuf>,
    right_subdir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct TimingConfigFile {
    report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Left camera directory, relative to the sequence root.
    pub left_subdir: PathBuf,
    /// Right camera directory, relative to the sequence root.
    pub right_subdir: PathBuf,
    /// Image file extension, without the dot.
    pub image_extension: String,
    /// Where to write the JSON timing report, if anywhere.
    pub timing_out: Option<PathBuf>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            left_subdir: PathBuf::from(DEFAULT_LEFT_SUBDIR),
            right_subdir: PathBuf::from(DEFAULT_RIGHT_SUBDIR),
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
            timing_out: None,
        }
    }
}

impl ReplayConfig {
    /// Defaults, then the JSON file named by `STEREO_REPLAY_CONFIG`, then
    /// `STEREO_REPLAY_*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("STEREO_REPLAY_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ReplayConfigFile) -> Self {
        let defaults = Self::default();
        let left_subdir = file
            .cameras
            .as_ref()
            .and_then(|cameras| cameras.left_subdir.clone())
            .unwrap_or(defaults.left_subdir);
        let right_subdir = file
            .cameras
            .and_then(|cameras| cameras.right_subdir)
            .unwrap_or(defaults.right_subdir);
        Self {
            left_subdir,
            right_subdir,
            image_extension: file.image_extension.unwrap_or(defaults.image_extension),
            timing_out: file.timing.and_then(|timing| timing.report_path),
        }
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("STEREO_REPLAY_LEFT_SUBDIR") {
            if !dir.trim().is_empty() {
                self.left_subdir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = std::env::var("STEREO_REPLAY_RIGHT_SUBDIR") {
            if !dir.trim().is_empty() {
                self.right_subdir = PathBuf::from(dir);
            }
        }
        if let Ok(ext) = std::env::var("STEREO_REPLAY_IMAGE_EXT") {
            if !ext.trim().is_empty() {
                self.image_extension = ext.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("STEREO_REPLAY_TIMING_OUT") {
            if !path.trim().is_empty() {
                self.timing_out = Some(PathBuf::from(path));
            }
        }
    }

    fn validate(&mut self) -> Result<()> {
        if self.left_subdir.as_os_str().is_empty() || self.right_subdir.as_os_str().is_empty() {
            return Err(ReplayError::configuration("camera subdirectories must not be empty").into());
        }
        if self.left_subdir == self.right_subdir {
            return Err(ReplayError::configuration(format!(
                "left and right cameras share directory {}",
                self.left_subdir.display()
            ))
            .into());
        }
        let ext = self.image_extension.trim().trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return Err(ReplayError::configuration(format!(
                "invalid image extension {:?}",
                self.image_extension
            ))
            .into());
        }
        self.image_extension = ext.to_string();
        Ok(())
    }

    /// Left and right camera roots under a sequence directory.
    pub fn camera_roots(&self, sequence: &Path) -> (PathBuf, PathBuf) {
        (
            sequence.join(&self.left_subdir),
            sequence.join(&self.right_subdir),
        )
    }
}

fn read_config_file(path: &Path) -> Result<ReplayConfigFile> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ReplayError::configuration(format!(
            "failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    let cfg = serde_json::from_str(&raw).map_err(|e| {
        ReplayError::configuration(format!("invalid config file {}: {}", path.display(), e))
    })?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_euroc_layout() {
        let cfg = ReplayConfig::default();
        let (left, right) = cfg.camera_roots(Path::new("/data/MH_01_easy"));
        assert_eq!(left, PathBuf::from("/data/MH_01_easy/mav0/cam0/data"));
        assert_eq!(right, PathBuf::from("/data/MH_01_easy/mav0/cam1/data"));
        assert_eq!(cfg.image_extension, "png");
    }

    #[test]
    fn partial_file_keeps_defaults() -> Result<()> {
        let file: ReplayConfigFile =
            serde_json::from_str(r#"{ "cameras": { "right_subdir": "right" } }"#)?;
        let cfg = ReplayConfig::from_file(file);
        assert_eq!(cfg.left_subdir, PathBuf::from(DEFAULT_LEFT_SUBDIR));
        assert_eq!(cfg.right_subdir, PathBuf::from("right"));
        assert_eq!(cfg.timing_out, None);
        Ok(())
    }

    #[test]
    fn validate_strips_leading_dot() -> Result<()> {
        let mut cfg = ReplayConfig {
            image_extension: ".jpg".to_string(),
            ..ReplayConfig::default()
        };
        cfg.validate()?;
        assert_eq!(cfg.image_extension, "jpg");
        Ok(())
    }

    #[test]
    fn validate_rejects_shared_camera_directory() {
        let mut cfg = ReplayConfig {
            right_subdir: PathBuf::from(DEFAULT_LEFT_SUBDIR),
            ..ReplayConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReplayError>(),
            Some(ReplayError::Configuration { .. })
        ));
    }

    #[test]
    fn validate_rejects_path_like_extension() {
        let mut cfg = ReplayConfig {
            image_extension: "png/../x".to_string(),
            ..ReplayConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
