//! Shading parameters and their GPU uniform representations.
//!
//! [`ShadingParams`] is the CPU-side parameter set an overlay UI or caller
//! mutates freely between frames. Each frame it is packed into the
//! `#[repr(C)]` uniform structs below and written to the pass's uniform
//! buffers. Field order and padding match the WGSL struct layouts exactly.

use glam::Vec3;

/// Fresnel reflectance at normal incidence for dielectric surfaces.
pub const DIELECTRIC_F0: f32 = 0.04;

/// The analytic light model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    /// Omnidirectional light with distance falloff.
    Point,
    /// Parallel rays from a direction, no falloff.
    Directional,
    /// Cone light with a smooth inner/outer cutoff.
    Spot,
}

impl LightKind {
    fn as_u32(self) -> u32 {
        match self {
            LightKind::Point => 0,
            LightKind::Directional => 1,
            LightKind::Spot => 2,
        }
    }
}

/// Per-vertex transform and camera uniforms (bind group 0, binding 0).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniforms {
    /// Model matrix (object to world space).
    pub model: [[f32; 4]; 4],
    /// View matrix (world to camera space).
    pub view: [[f32; 4]; 4],
    /// Projection matrix (camera to clip space).
    pub proj: [[f32; 4]; 4],
    /// Camera position in world space, for the view vector.
    pub camera_pos: [f32; 3],
    /// Elapsed time in seconds.
    pub time: f32,
}

/// Light uniforms (bind group 0, binding 1).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniforms {
    pub light_pos: [f32; 3],
    pub light_kind: u32,
    /// Light color with intensity premultiplied.
    pub light_color: [f32; 3],
    pub spot_cos_inner: f32,
    pub ambient: [f32; 3],
    pub spot_cos_outer: f32,
    pub light_dir: [f32; 3],
    pub _pad: f32,
}

/// Material uniforms (bind group 0, binding 2).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    pub base_tint: [f32; 3],
    pub roughness: f32,
    pub dielectric_f0: [f32; 3],
    pub metallic: f32,
    pub use_base_color_map: u32,
    pub use_normal_map: u32,
    pub use_roughness_map: u32,
    pub use_metallic_map: u32,
    pub use_ao_map: u32,
    pub use_ibl: u32,
    pub _pad: [u32; 2],
}

/// The full set of interactively tweakable shading parameters.
#[derive(Clone, Debug)]
pub struct ShadingParams {
    pub light_kind: LightKind,
    pub light_position: Vec3,
    pub light_direction: Vec3,
    pub light_color: Vec3,
    pub light_intensity: f32,
    pub ambient: Vec3,
    /// Spot cone angles in degrees; inner must not exceed outer.
    pub spot_inner_deg: f32,
    pub spot_outer_deg: f32,
    pub base_tint: Vec3,
    pub roughness: f32,
    pub metallic: f32,
    pub use_base_color_map: bool,
    pub use_normal_map: bool,
    pub use_roughness_map: bool,
    pub use_metallic_map: bool,
    pub use_ao_map: bool,
    pub use_ibl: bool,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            light_kind: LightKind::Point,
            light_position: Vec3::new(0.0, 2.0, 3.0),
            light_direction: Vec3::new(0.0, -0.7, 0.3).normalize(),
            light_color: Vec3::ONE,
            light_intensity: 3.0,
            ambient: Vec3::splat(0.1),
            spot_inner_deg: 15.0,
            spot_outer_deg: 25.0,
            base_tint: Vec3::ONE,
            roughness: 0.8,
            metallic: 0.0,
            use_base_color_map: true,
            use_normal_map: true,
            use_roughness_map: true,
            use_metallic_map: false,
            use_ao_map: false,
            use_ibl: true,
        }
    }
}

impl ShadingParams {
    /// Pack the light state for upload.
    ///
    /// Intensity is premultiplied into the color and the spot angles are
    /// converted to cosine-space cutoffs so the shader compares against
    /// `dot(L, spot_dir)` directly.
    pub fn lighting_uniforms(&self) -> LightingUniforms {
        LightingUniforms {
            light_pos: self.light_position.to_array(),
            light_kind: self.light_kind.as_u32(),
            light_color: (self.light_color * self.light_intensity).to_array(),
            spot_cos_inner: self.spot_inner_deg.to_radians().cos(),
            ambient: self.ambient.to_array(),
            spot_cos_outer: self.spot_outer_deg.to_radians().cos(),
            light_dir: self.light_direction.normalize_or_zero().to_array(),
            _pad: 0.0,
        }
    }

    /// Pack the material state for upload.
    pub fn material_uniforms(&self) -> MaterialUniforms {
        MaterialUniforms {
            base_tint: self.base_tint.to_array(),
            roughness: self.roughness,
            dielectric_f0: [DIELECTRIC_F0; 3],
            metallic: self.metallic,
            use_base_color_map: self.use_base_color_map as u32,
            use_normal_map: self.use_normal_map as u32,
            use_roughness_map: self.use_roughness_map as u32,
            use_metallic_map: self.use_metallic_map as u32,
            use_ao_map: self.use_ao_map as u32,
            use_ibl: self.use_ibl as u32,
            _pad: [0; 2],
        }
    }
}

/// Direction of the animated day-cycle light at a given time.
///
/// The elevation bobs between roughly 0.15 and 0.8 radians while the light
/// always points toward the scene, giving the idle viewer some motion.
pub fn animated_light_direction(time: f32) -> Vec3 {
    let elevation = 0.15 + 0.65 * 0.5 * (1.0 + (time * 0.7).sin());
    Vec3::new(0.0, -elevation.cos(), elevation.sin()).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_struct_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<TransformUniforms>(), 208);
        assert_eq!(std::mem::size_of::<LightingUniforms>(), 64);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 64);
    }

    #[test]
    fn intensity_premultiplied_into_color() {
        let params = ShadingParams {
            light_color: Vec3::new(1.0, 0.5, 0.25),
            light_intensity: 4.0,
            ..Default::default()
        };
        let u = params.lighting_uniforms();
        assert_eq!(u.light_color, [4.0, 2.0, 1.0]);
    }

    #[test]
    fn spot_cutoffs_are_cosines() {
        let params = ShadingParams::default();
        let u = params.lighting_uniforms();
        assert!((u.spot_cos_inner - 15f32.to_radians().cos()).abs() < 1e-6);
        assert!((u.spot_cos_outer - 25f32.to_radians().cos()).abs() < 1e-6);
        // A narrower cone has the larger cosine.
        assert!(u.spot_cos_inner > u.spot_cos_outer);
    }

    #[test]
    fn toggles_pack_as_zero_or_one() {
        let u = ShadingParams::default().material_uniforms();
        assert_eq!(u.use_base_color_map, 1);
        assert_eq!(u.use_normal_map, 1);
        assert_eq!(u.use_roughness_map, 1);
        assert_eq!(u.use_metallic_map, 0);
        assert_eq!(u.use_ao_map, 0);
        assert_eq!(u.use_ibl, 1);
    }

    #[test]
    fn light_direction_normalized_in_uniforms() {
        let params = ShadingParams {
            light_direction: Vec3::new(0.0, -7.0, 3.0),
            ..Default::default()
        };
        let dir = Vec3::from(params.lighting_uniforms().light_dir);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn animated_light_stays_unit_and_downward() {
        for i in 0..100 {
            let dir = animated_light_direction(i as f32 * 0.37);
            assert!((dir.length() - 1.0).abs() < 1e-5);
            assert!(dir.y < 0.0);
            assert!(dir.z > 0.0);
        }
    }

    #[test]
    fn default_f0_is_dielectric() {
        let u = ShadingParams::default().material_uniforms();
        assert_eq!(u.dielectric_f0, [0.04; 3]);
    }
}
