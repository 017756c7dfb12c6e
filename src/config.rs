//! Pipeline configuration, loadable from JSON.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{Result, WinogradError};
use crate::gpu::constants::WINOGRAD_KERNELS;

/// Which accelerator runtime executes the stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Host,
    OpenCl,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "gpu") {
            Backend::OpenCl
        } else {
            Backend::Host
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "host" | "cpu-reference" => Ok(Backend::Host),
            "opencl" | "ocl" | "gpu" => Ok(Backend::OpenCl),
            other => Err(format!("unknown backend '{}' (expected host or opencl)", other)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Host => f.write_str("host"),
            Backend::OpenCl => f.write_str("opencl"),
        }
    }
}

/// Which kind of OpenCL device to select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Gpu,
    Cpu,
    Any,
}

impl FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gpu" => Ok(DevicePreference::Gpu),
            "cpu" => Ok(DevicePreference::Cpu),
            "any" => Ok(DevicePreference::Any),
            other => Err(format!("unknown device preference '{}' (expected gpu, cpu or any)", other)),
        }
    }
}

/// Settings for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub backend: Backend,
    /// OpenCL C source with the four stage kernels; the bundled source when unset
    pub kernel_source: Option<PathBuf>,
    pub device_preference: DevicePreference,
    /// Cross-check the output against direct convolution
    pub verify: bool,
    /// Keep device buffers pooled between runs of the same shape
    pub reuse_buffers: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            kernel_source: None,
            device_preference: DevicePreference::default(),
            verify: false,
            reuse_buffers: true,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| WinogradError::File(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Program source for the configured kernels
    pub fn load_kernel_source(&self) -> Result<String> {
        match &self.kernel_source {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| WinogradError::File(format!("Failed to open {}: {}", path.display(), e))),
            None => Ok(WINOGRAD_KERNELS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PipelineConfig::from_json(r#"{ "backend": "host", "verify": true }"#).unwrap();
        assert_eq!(config.backend, Backend::Host);
        assert!(config.verify);
        assert!(config.reuse_buffers);
        assert_eq!(config.device_preference, DevicePreference::Gpu);
        assert!(config.kernel_source.is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig {
            backend: Backend::OpenCl,
            kernel_source: Some(PathBuf::from("kernels/winograd.cl")),
            device_preference: DevicePreference::Any,
            verify: true,
            reuse_buffers: false,
        };
        let parsed = PipelineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = PipelineConfig::from_json("{ backend: ").unwrap_err();
        assert!(matches!(err, WinogradError::Config(_)));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("host".parse::<Backend>().unwrap(), Backend::Host);
        assert_eq!("OpenCL".parse::<Backend>().unwrap(), Backend::OpenCl);
        assert!("cuda".parse::<Backend>().is_err());
    }

    #[test]
    fn test_bundled_source_has_all_kernels() {
        let source = PipelineConfig::default().load_kernel_source().unwrap();
        for name in ["filter_transform", "data_transform", "calc_M", "calc_Y"] {
            assert!(source.contains(&format!("__kernel void {}(", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_missing_kernel_file_is_file_error() {
        let config = PipelineConfig {
            kernel_source: Some(PathBuf::from("/nonexistent/winograd.cl")),
            ..PipelineConfig::default()
        };
        assert!(matches!(config.load_kernel_source(), Err(WinogradError::File(_))));
    }
}
