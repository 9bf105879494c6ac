//! WGSL shader sources, embedded with optional on-disk overrides.
//!
//! Every shader ships embedded via `include_str!` so the binary renders
//! without any files on disk. If a `shaders/<name>.wgsl` file exists next
//! to the working directory it is tried first, letting users tweak shading
//! without rebuilding; a broken override is logged and the embedded source
//! keeps rendering.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use crate::gpu::GpuContext;

const PBR: &str = include_str!("shaders/pbr.wgsl");
const SKYBOX: &str = include_str!("shaders/skybox.wgsl");
const EQUIRECT_TO_CUBEMAP: &str = include_str!("shaders/equirect_to_cubemap.wgsl");
const IRRADIANCE_CONVOLUTION: &str = include_str!("shaders/irradiance_convolution.wgsl");

fn embedded_source(name: &str) -> &'static str {
    match name {
        "pbr" => PBR,
        "skybox" => SKYBOX,
        "equirect_to_cubemap" => EQUIRECT_TO_CUBEMAP,
        "irradiance_convolution" => IRRADIANCE_CONVOLUTION,
        other => panic!("unknown shader '{}'", other),
    }
}

/// Compile a shader module, catching the validation panic wgpu raises for
/// invalid WGSL so a bad override can't take the viewer down.
fn try_compile(gpu: &GpuContext, label: &str, source: &str) -> Option<wgpu::ShaderModule> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        gpu.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
    }));
    result.ok()
}

/// Create the shader module for `name`, preferring an on-disk override.
pub fn create_module(gpu: &GpuContext, name: &str) -> wgpu::ShaderModule {
    let override_path = PathBuf::from("shaders").join(format!("{}.wgsl", name));
    if let Ok(source) = std::fs::read_to_string(&override_path) {
        match try_compile(gpu, name, &source) {
            Some(module) => {
                log::info!("Using shader override '{}'", override_path.display());
                return module;
            }
            None => {
                log::warn!(
                    "Shader override '{}' failed to compile; using built-in",
                    override_path.display()
                );
            }
        }
    }

    try_compile(gpu, name, embedded_source(name))
        .unwrap_or_else(|| panic!("built-in shader '{}' failed to compile", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_sources_present() {
        for name in ["pbr", "skybox", "equirect_to_cubemap", "irradiance_convolution"] {
            let src = embedded_source(name);
            assert!(src.contains("@vertex"), "{} missing vertex stage", name);
            assert!(src.contains("@fragment"), "{} missing fragment stage", name);
        }
    }
}
