//! Skybox pass: draws the environment cubemap behind everything else.
//!
//! The pipeline uses a LessEqual depth compare with depth writes disabled,
//! so the sky (which the shader pins to depth 1.0) passes against the
//! cleared depth buffer but never occludes the model. Depth state is part
//! of the pipeline, so switching back to the mesh pipeline restores the
//! strict compare automatically.

use glam::{Mat3, Mat4};

use crate::environment::{CUBE_LAYOUT, CUBE_POSITIONS, Cubemap};
use crate::gpu::GpuContext;
use crate::shaders;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyUniforms {
    proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
}

/// Builds the skybox view matrix for a frame.
///
/// The camera view is composed with a slow idle rotation (yaw plus a
/// gentle pitch sway), then the translation is stripped so the sky stays
/// centered on the camera.
pub fn sky_view(view: Mat4, time: f32) -> Mat4 {
    let rotation = Mat4::from_rotation_y(0.25 * time) * Mat4::from_rotation_x(0.3 * (0.2 * time).sin());
    Mat4::from_mat3(Mat3::from_mat4(view * rotation))
}

pub struct SkyboxPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    cube_buffer: wgpu::Buffer,
}

impl SkyboxPass {
    pub fn new(gpu: &GpuContext) -> Self {
        use wgpu::util::DeviceExt;

        let device = &gpu.device;
        let shader = shaders::create_module(gpu, "skybox");

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sky Uniforms"),
            size: std::mem::size_of::<SkyUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Skybox Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[CUBE_LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Viewed from inside the cube.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let cube_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Cube Vertices"),
            contents: bytemuck::cast_slice(&CUBE_POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group_layout,
            cube_buffer,
        }
    }

    /// Draws the sky. Call after the model so most fragments fail the
    /// depth test early.
    pub fn render(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        proj: Mat4,
        view: Mat4,
        environment: &Cubemap,
    ) {
        let uniforms = SkyUniforms {
            proj: proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        // The environment cubemap can be replaced by a reload between
        // frames, so the bind group is rebuilt per draw.
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&environment.sampler),
                },
            ],
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.cube_buffer.slice(..));
        render_pass.draw(0..36, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn sky_view_strips_translation() {
        let view = Mat4::look_at_rh(Vec3::new(3.0, 4.0, 5.0), Vec3::ZERO, Vec3::Y);
        let sky = sky_view(view, 1.7);
        assert!((sky.w_axis - Vec4::W).length() < 1e-6);
    }

    #[test]
    fn sky_view_is_pure_rotation() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 8.0), Vec3::ZERO, Vec3::Y);
        let sky = sky_view(view, 42.0);
        let rot = Mat3::from_mat4(sky);
        // Orthonormal columns, determinant +1.
        assert!((rot.determinant() - 1.0).abs() < 1e-4);
        assert!((rot.x_axis.length() - 1.0).abs() < 1e-4);
        assert!((rot.y_axis.length() - 1.0).abs() < 1e-4);
        assert!((rot.z_axis.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn sky_view_rotates_over_time() {
        let view = Mat4::IDENTITY;
        let a = sky_view(view, 0.0);
        let b = sky_view(view, 2.0);
        assert!((a.x_axis - b.x_axis).length() > 1e-3);
    }
}
