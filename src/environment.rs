//! Environment precomputation: equirect panorama to cubemap, and diffuse
//! irradiance convolution.
//!
//! Both operations render a unit cube once per face into a 6-layer
//! Rgba16Float texture, with a 90-degree projection and a fixed per-face
//! view matrix. All transient resources (capture pipeline, vertex buffer,
//! uniform buffer) drop at the end of the call; every pass is scoped, so
//! nothing leaks into later rendering.

use glam::{Mat4, Vec3};

use crate::gpu::GpuContext;
use crate::shaders;
use crate::texture::Texture;

/// Position-only unit cube, 36 vertices, used by the capture passes and
/// the skybox.
#[rustfmt::skip]
pub(crate) const CUBE_POSITIONS: [f32; 108] = [
    // back
    -1.0, -1.0, -1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,
     1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,
    // front
    -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,
    // left
    -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,
    -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,
    // right
     1.0,  1.0,  1.0,   1.0, -1.0, -1.0,   1.0,  1.0, -1.0,
     1.0, -1.0, -1.0,   1.0,  1.0,  1.0,   1.0, -1.0,  1.0,
    // bottom
    -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,   1.0, -1.0,  1.0,
     1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,  -1.0, -1.0, -1.0,
    // top
    -1.0,  1.0, -1.0,   1.0,  1.0,  1.0,   1.0,  1.0, -1.0,
     1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,
];

/// Vertex layout for the position-only capture cube.
pub(crate) const CUBE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

/// Projection shared by every capture face: 90-degree FOV, square aspect,
/// near/far bracketing the unit cube.
pub fn face_projection() -> Mat4 {
    Mat4::perspective_rh(90f32.to_radians(), 1.0, 0.1, 10.0)
}

/// Per-face view matrices in cubemap layer order (+X, -X, +Y, -Y, +Z, -Z).
///
/// The up vectors follow the cubemap convention: Y faces use Z-aligned up,
/// the others use -Y.
pub fn face_views() -> [Mat4; 6] {
    let look = |dir: Vec3, up: Vec3| Mat4::look_at_rh(Vec3::ZERO, dir, up);
    [
        look(Vec3::X, Vec3::NEG_Y),
        look(Vec3::NEG_X, Vec3::NEG_Y),
        look(Vec3::Y, Vec3::Z),
        look(Vec3::NEG_Y, Vec3::NEG_Z),
        look(Vec3::Z, Vec3::NEG_Y),
        look(Vec3::NEG_Z, Vec3::NEG_Y),
    ]
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CaptureUniforms {
    proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
}

/// A GPU cubemap with a cube-dimension view for sampling.
#[derive(Debug)]
pub struct Cubemap {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub face_size: u32,
}

impl Cubemap {
    fn create_target(gpu: &GpuContext, face_size: u32, label: &str) -> wgpu::Texture {
        gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: face_size,
                height: face_size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn finish(gpu: &GpuContext, texture: wgpu::Texture, face_size: u32, label: &str) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            face_size,
        }
    }

    /// A solid-color cubemap, used until a panorama loads successfully.
    pub fn solid(gpu: &GpuContext, face_size: u32, color: Vec3) -> Self {
        let texel = [
            half::f16::from_f32(color.x).to_bits(),
            half::f16::from_f32(color.y).to_bits(),
            half::f16::from_f32(color.z).to_bits(),
            half::f16::from_f32(1.0).to_bits(),
        ];
        let texels = (face_size * face_size) as usize;
        let mut face_data = Vec::with_capacity(texels * 4);
        for _ in 0..texels {
            face_data.extend_from_slice(&texel);
        }

        let texture = Self::create_target(gpu, face_size, "Solid Cubemap");
        for face in 0..6u32 {
            gpu.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: face,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(&face_data),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(8 * face_size),
                    rows_per_image: Some(face_size),
                },
                wgpu::Extent3d {
                    width: face_size,
                    height: face_size,
                    depth_or_array_layers: 1,
                },
            );
        }

        Self::finish(gpu, texture, face_size, "Solid Cubemap")
    }
}

/// Renders the capture cube six times, once per cubemap face, with the
/// given shader and source binding.
fn render_faces(
    gpu: &GpuContext,
    shader_name: &str,
    source_view: &wgpu::TextureView,
    source_sampler: &wgpu::Sampler,
    source_dimension: wgpu::TextureViewDimension,
    face_size: u32,
    label: &str,
) -> Cubemap {
    use wgpu::util::DeviceExt;

    let device = &gpu.device;
    let shader = shaders::create_module(gpu, shader_name);

    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Capture Uniforms"),
        size: std::mem::size_of::<CaptureUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Capture Bind Group Layout"),
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
                    view_dimension: source_dimension,
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

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Capture Bind Group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(source_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(source_sampler),
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Capture Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Capture Pipeline"),
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
                format: wgpu::TextureFormat::Rgba16Float,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    let cube_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Capture Cube Vertices"),
        contents: bytemuck::cast_slice(&CUBE_POSITIONS),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let target = Cubemap::create_target(gpu, face_size, label);
    let proj = face_projection();
    let views = face_views();

    // One submit per face: write_buffer is staged at submit time, so the
    // uniform update must land before the pass that reads it.
    for (face, view) in views.iter().enumerate() {
        let uniforms = CaptureUniforms {
            proj: proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let face_view = target.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Capture Face View"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_array_layer: face as u32,
            array_layer_count: Some(1),
            ..Default::default()
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Capture Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &face_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, cube_buffer.slice(..));
            pass.draw(0..36, 0..1);
        }
        gpu.queue.submit(Some(encoder.finish()));
    }

    Cubemap::finish(gpu, target, face_size, label)
}

/// Project an equirectangular HDR panorama onto a cubemap.
pub fn project_panorama(gpu: &GpuContext, panorama: &Texture, face_size: u32) -> Cubemap {
    log::info!("Projecting panorama to {0}x{0} cubemap", face_size);
    render_faces(
        gpu,
        "equirect_to_cubemap",
        &panorama.view,
        &panorama.sampler,
        wgpu::TextureViewDimension::D2,
        face_size,
        "Environment Cubemap",
    )
}

/// Convolve an environment cubemap into a diffuse irradiance cubemap.
///
/// The result varies smoothly with direction, so a small face size is
/// plenty; 32 matches the sampling density of the convolution shader.
pub fn convolve_irradiance(gpu: &GpuContext, environment: &Cubemap, face_size: u32) -> Cubemap {
    log::info!("Convolving irradiance at {0}x{0} per face", face_size);
    render_faces(
        gpu,
        "irradiance_convolution",
        &environment.view,
        &environment.sampler,
        wgpu::TextureViewDimension::Cube,
        face_size,
        "Irradiance Cubemap",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn capture_cube_spans_unit_bounds() {
        assert_eq!(CUBE_POSITIONS.len(), 108);
        for c in CUBE_POSITIONS {
            assert!(c == 1.0 || c == -1.0);
        }
    }

    #[test]
    fn projection_is_90_degrees_square() {
        let proj = face_projection();
        // 90-degree FOV at aspect 1.0 puts 1.0 on both focal diagonals.
        assert!((proj.x_axis.x - 1.0).abs() < 1e-5);
        assert!((proj.y_axis.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn face_views_look_down_each_axis() {
        let dirs = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for (view, dir) in face_views().iter().zip(dirs) {
            // The face direction maps to the view-space forward axis (-Z).
            let forward = *view * Vec4::new(dir.x, dir.y, dir.z, 0.0);
            assert!((forward.z + 1.0).abs() < 1e-5, "dir {:?} -> {:?}", dir, forward);
            assert!(forward.x.abs() < 1e-5);
            assert!(forward.y.abs() < 1e-5);
        }
    }

    #[test]
    fn face_views_have_no_translation() {
        for view in face_views() {
            let t = view.w_axis;
            assert!((Vec4::new(t.x, t.y, t.z, t.w) - Vec4::W).length() < 1e-5);
        }
    }
}
