//! The viewer scene: owned resources, reload operations, and per-frame
//! orchestration.
//!
//! [`ViewerScene`] owns the mesh slot, the five material map slots, the
//! environment/irradiance cubemaps, the camera, and both render passes.
//! Reload operations replace a slot by assignment; the previous GPU
//! resource drops once the queue is done with it.

use glam::{Mat4, Vec2, Vec3};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::app::ViewerConfig;
use crate::environment::{self, Cubemap};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::geometry::MeshData;
use crate::mesh::Mesh;
use crate::orbit_camera::OrbitCamera;
use crate::pbr_pass::{MaterialMaps, PbrPass};
use crate::shading::{self, ShadingParams, TransformUniforms};
use crate::skybox::{self, SkyboxPass};
use crate::texture::Texture;

/// Irradiance varies smoothly with direction; tiny faces suffice.
const IRRADIANCE_FACE_SIZE: u32 = 32;

/// The material map slots that can be reloaded at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSlot {
    BaseColor,
    Normal,
    Roughness,
    Metallic,
    Ao,
}

/// Model orientation as a rotation-only matrix: yaw about Y, then pitch
/// about X. Angles in degrees.
pub fn model_rotation(yaw_deg: f32, pitch_deg: f32) -> Mat4 {
    Mat4::from_rotation_y(yaw_deg.to_radians()) * Mat4::from_rotation_x(pitch_deg.to_radians())
}

/// Degrees of model rotation per pixel of right-drag.
const MODEL_DRAG_SENSITIVITY: f32 = 0.3;

/// New model angles after a right-drag of `delta` pixels: horizontal drag
/// yaws, vertical drag pitches, neither is clamped.
pub fn drag_model(yaw_deg: f32, pitch_deg: f32, delta: Vec2) -> (f32, f32) {
    (
        yaw_deg + delta.x * MODEL_DRAG_SENSITIVITY,
        pitch_deg + delta.y * MODEL_DRAG_SENSITIVITY,
    )
}

/// Everything the viewer shows, plus the passes that show it.
pub struct ViewerScene {
    pbr_pass: PbrPass,
    skybox_pass: SkyboxPass,
    mesh: Mesh,
    base_color: Texture,
    normal: Texture,
    roughness: Texture,
    metallic: Texture,
    ao: Texture,
    environment: Cubemap,
    irradiance: Cubemap,
    env_face_size: u32,
    pub camera: OrbitCamera,
    pub params: ShadingParams,
    /// Overrides the light direction with the animated day cycle.
    pub animate_light: bool,
    /// Model yaw in degrees, driven by right-drag.
    pub model_yaw: f32,
    /// Model pitch in degrees, driven by right-drag.
    pub model_pitch: f32,
}

impl ViewerScene {
    pub fn new(gpu: &GpuContext, config: &ViewerConfig) -> Self {
        let mesh_data = match &config.model_path {
            Some(path) => MeshData::load_obj_or_cube(path),
            None => MeshData::cube(),
        };
        let mesh = Mesh::from_data(gpu, &mesh_data);

        // Material maps are authored with a bottom-left UV origin, so they
        // are flipped on load to match the imported UVs.
        let base_color = Texture::load_color(gpu, &config.base_color_path, true, true);
        let normal = Texture::load_color(gpu, &config.normal_path, true, true);
        let roughness = Texture::load_color(gpu, &config.roughness_path, true, true);
        let metallic = Texture::load_color(gpu, &config.metallic_path, true, true);
        let ao = Texture::load_color(gpu, &config.ao_path, true, true);

        let (environment, irradiance) = match Texture::load_hdr(gpu, &config.panorama_path) {
            Some(panorama) => {
                let environment =
                    environment::project_panorama(gpu, &panorama, config.env_face_size);
                let irradiance =
                    environment::convolve_irradiance(gpu, &environment, IRRADIANCE_FACE_SIZE);
                (environment, irradiance)
            }
            None => {
                // Flat gray sky; a later reload can replace it.
                let gray = Vec3::splat(0.1);
                (
                    Cubemap::solid(gpu, 4, gray),
                    Cubemap::solid(gpu, 4, gray),
                )
            }
        };

        Self {
            pbr_pass: PbrPass::new(gpu),
            skybox_pass: SkyboxPass::new(gpu),
            mesh,
            base_color,
            normal,
            roughness,
            metallic,
            ao,
            environment,
            irradiance,
            env_face_size: config.env_face_size,
            camera: OrbitCamera::new(),
            params: ShadingParams::default(),
            animate_light: true,
            model_yaw: 0.0,
            model_pitch: 0.0,
        }
    }

    /// Replace the model; the cube fallback applies on any load failure.
    pub fn reload_mesh(&mut self, gpu: &GpuContext, path: impl AsRef<std::path::Path>) {
        self.mesh = Mesh::from_data(gpu, &MeshData::load_obj_or_cube(path));
    }

    /// Replace one material map; a load failure yields the white fallback.
    pub fn reload_texture(
        &mut self,
        gpu: &GpuContext,
        slot: TextureSlot,
        path: impl AsRef<std::path::Path>,
    ) {
        let texture = Texture::load_color(gpu, path, true, true);
        match slot {
            TextureSlot::BaseColor => self.base_color = texture,
            TextureSlot::Normal => self.normal = texture,
            TextureSlot::Roughness => self.roughness = texture,
            TextureSlot::Metallic => self.metallic = texture,
            TextureSlot::Ao => self.ao = texture,
        }
    }

    /// Replace the environment from a new HDR panorama and rerun both
    /// precompute passes. If the panorama fails to load the previous
    /// environment stays in place.
    pub fn reload_environment(&mut self, gpu: &GpuContext, path: impl AsRef<std::path::Path>) {
        if let Some(panorama) = Texture::load_hdr(gpu, path) {
            self.environment = environment::project_panorama(gpu, &panorama, self.env_face_size);
            self.irradiance =
                environment::convolve_irradiance(gpu, &self.environment, IRRADIANCE_FACE_SIZE);
        }
    }

    /// Route input: orbit the camera, rotate the model with right-drag,
    /// and service the map toggle keys.
    pub fn handle_input(&mut self, input: &Input) {
        self.camera.update(input);

        if input.mouse_down(MouseButton::Right) && !input.pointer_captured() {
            let (yaw, pitch) = drag_model(self.model_yaw, self.model_pitch, input.mouse_delta());
            self.model_yaw = yaw;
            self.model_pitch = pitch;
        }

        let toggles = [
            (KeyCode::Digit1, "base color map"),
            (KeyCode::Digit2, "normal map"),
            (KeyCode::Digit3, "roughness map"),
            (KeyCode::Digit4, "metallic map"),
            (KeyCode::Digit5, "ao map"),
            (KeyCode::Digit6, "image-based lighting"),
        ];
        for (key, name) in toggles {
            if input.key_pressed(key) {
                let flag = match key {
                    KeyCode::Digit1 => &mut self.params.use_base_color_map,
                    KeyCode::Digit2 => &mut self.params.use_normal_map,
                    KeyCode::Digit3 => &mut self.params.use_roughness_map,
                    KeyCode::Digit4 => &mut self.params.use_metallic_map,
                    KeyCode::Digit5 => &mut self.params.use_ao_map,
                    _ => &mut self.params.use_ibl,
                };
                *flag = !*flag;
                log::info!("{}: {}", name, if *flag { "on" } else { "off" });
            }
        }
    }

    /// Draw one frame into the given pass: the model first, then the sky
    /// behind it.
    pub fn render(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        aspect: f32,
        time: f32,
    ) {
        let view = self.camera.view_matrix();
        let proj = Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, 100.0);

        let transform = TransformUniforms {
            model: model_rotation(self.model_yaw, self.model_pitch).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            camera_pos: self.camera.position().to_array(),
            time,
        };

        let mut lighting = self.params.lighting_uniforms();
        if self.animate_light {
            lighting.light_dir = shading::animated_light_direction(time).to_array();
        }
        let material = self.params.material_uniforms();

        let maps = MaterialMaps {
            base_color: &self.base_color,
            normal: &self.normal,
            roughness: &self.roughness,
            metallic: &self.metallic,
            ao: &self.ao,
        };

        self.pbr_pass.render(
            gpu,
            render_pass,
            &transform,
            &lighting,
            &material,
            &maps,
            &self.irradiance,
            &self.environment,
            &self.mesh,
        );

        self.skybox_pass.render(
            gpu,
            render_pass,
            proj,
            skybox::sky_view(view, time),
            &self.environment,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn model_rotation_is_rotation_only() {
        let m = model_rotation(35.0, -20.0);
        assert!((m.w_axis - Vec4::W).length() < 1e-6);
        assert!((m.determinant() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn model_rotation_yaw_spins_about_y() {
        let m = model_rotation(90.0, 0.0);
        let rotated = m * Vec4::new(1.0, 0.0, 0.0, 0.0);
        // +X swings to -Z under a 90-degree yaw.
        assert!((rotated.z + 1.0).abs() < 1e-5);
        assert!(rotated.y.abs() < 1e-6);
    }

    #[test]
    fn zero_rotation_is_identity() {
        let m = model_rotation(0.0, 0.0);
        assert!((m - Mat4::IDENTITY).abs().to_cols_array().iter().sum::<f32>() < 1e-6);
    }

    #[test]
    fn drag_model_scales_by_sensitivity() {
        let (yaw, pitch) = drag_model(10.0, -5.0, Vec2::new(100.0, -40.0));
        assert!((yaw - 40.0).abs() < 1e-4);
        assert!((pitch + 17.0).abs() < 1e-4);
    }

    #[test]
    fn drag_model_zero_delta_is_identity() {
        let (yaw, pitch) = drag_model(33.0, 12.0, Vec2::ZERO);
        assert_eq!((yaw, pitch), (33.0, 12.0));
    }
}
