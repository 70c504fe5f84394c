use crate::error::{Result, SweetspotError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Argument-mapping behaviour shared by a group of encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncoderFamily {
    /// libx264, libx264rgb, libx265
    X264,
    /// NVIDIA NVENC
    Nvenc,
    /// VA-API hardware encoders
    Vaapi,
    /// libvpx-vp9
    Vpx,
    /// libaom-av1
    Aom,
    /// SVT-AV1
    Svt,
}

impl EncoderFamily {
    /// Families whose rate control needs an analysis pass first.
    pub fn is_two_pass(self) -> bool {
        matches!(self, EncoderFamily::Vpx | EncoderFamily::Aom)
    }

    pub fn uses_hwaccel(self) -> bool {
        self == EncoderFamily::Vaapi
    }
}

pub struct EncoderRegistry {
    families: HashMap<String, EncoderFamily>,
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        let mut registry = Self {
            families: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }
}

impl EncoderRegistry {
    pub fn register(&mut self, encoder: &str, family: EncoderFamily) {
        self.families.insert(encoder.to_string(), family);
    }

    pub fn family_for(&self, encoder: &str) -> Result<EncoderFamily> {
        self.families.get(encoder).copied().ok_or_else(|| {
            SweetspotError::Configuration(format!("Could not find codec '{}'", encoder))
        })
    }

    pub fn encoders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.families.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn register_builtin(&mut self) {
        let builtin = [
            ("libx264", EncoderFamily::X264),
            ("libx264rgb", EncoderFamily::X264),
            ("libx265", EncoderFamily::X264),
            ("h264_nvenc", EncoderFamily::Nvenc),
            ("hevc_nvenc", EncoderFamily::Nvenc),
            ("h264_vaapi", EncoderFamily::Vaapi),
            ("hevc_vaapi", EncoderFamily::Vaapi),
            ("vp9_vaapi", EncoderFamily::Vaapi),
            ("libvpx-vp9", EncoderFamily::Vpx),
            ("libaom-av1", EncoderFamily::Aom),
            ("libsvt_av1", EncoderFamily::Svt),
        ];
        for (encoder, family) in builtin {
            self.register(encoder, family);
        }
    }
}
