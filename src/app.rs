//! Window lifecycle and the frame loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::gpu::GpuContext;
use crate::input::Input;
use crate::scene::ViewerScene;

/// Startup configuration: window size and asset paths.
///
/// Every asset path has a forgiving failure mode (cube, white texture, or
/// flat sky), so a default-constructed config always produces a running
/// viewer.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// OBJ model to view; `None` shows the built-in cube.
    pub model_path: Option<PathBuf>,
    pub base_color_path: PathBuf,
    pub normal_path: PathBuf,
    pub roughness_path: PathBuf,
    pub metallic_path: PathBuf,
    pub ao_path: PathBuf,
    /// Equirectangular HDR panorama for the environment.
    pub panorama_path: PathBuf,
    /// Resolution of each environment cubemap face.
    pub env_face_size: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Helion".to_string(),
            width: 800,
            height: 600,
            model_path: Some(PathBuf::from("model.obj")),
            base_color_path: PathBuf::from("textures/base_color.png"),
            normal_path: PathBuf::from("textures/normal.png"),
            roughness_path: PathBuf::from("textures/roughness.png"),
            metallic_path: PathBuf::from("textures/metallic.png"),
            ao_path: PathBuf::from("textures/ao.png"),
            panorama_path: PathBuf::from("textures/sky.hdr"),
            env_face_size: 512,
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn model(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn panorama(mut self, path: impl Into<PathBuf>) -> Self {
        self.panorama_path = path.into();
        self
    }

    pub fn env_face_size(mut self, size: u32) -> Self {
        self.env_face_size = size;
        self
    }
}

/// Run the viewer until the window closes.
pub fn run(config: ViewerConfig) {
    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::Pending { config };
    event_loop.run_app(&mut app).unwrap();
}

enum ViewerApp {
    Pending {
        config: ViewerConfig,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        scene: ViewerScene,
        input: Input,
        depth_texture: wgpu::Texture,
        depth_view: wgpu::TextureView,
        depth_size: (u32, u32),
        start_time: Instant,
    },
}

fn create_depth_texture(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let ViewerApp::Pending { config } = self {
            let window_attrs = WindowAttributes::default()
                .with_title(&config.title)
                .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

            let window = Arc::new(event_loop.create_window(window_attrs).unwrap());
            let gpu = GpuContext::new(window.clone());
            let scene = ViewerScene::new(&gpu, config);
            let (depth_texture, depth_view) = create_depth_texture(&gpu);
            let depth_size = (gpu.width(), gpu.height());

            window.request_redraw();

            *self = ViewerApp::Running {
                window,
                gpu,
                scene,
                input: Input::new(),
                depth_texture,
                depth_view,
                depth_size,
                start_time: Instant::now(),
            };
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ViewerApp::Running {
            window,
            gpu,
            scene,
            input,
            depth_texture,
            depth_view,
            depth_size,
            start_time,
        } = self
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let time = start_time.elapsed().as_secs_f32();

                scene.handle_input(input);

                if *depth_size != (gpu.width(), gpu.height()) {
                    let (texture, view) = create_depth_texture(gpu);
                    *depth_texture = texture;
                    *depth_view = view;
                    *depth_size = (gpu.width(), gpu.height());
                }

                let output = gpu.surface.get_current_texture().unwrap();
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                let mut encoder =
                    gpu.device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Frame Encoder"),
                        });

                {
                    let mut render_pass =
                        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("Scene Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Clear(wgpu::Color {
                                        r: 0.1,
                                        g: 0.1,
                                        b: 0.1,
                                        a: 1.0,
                                    }),
                                    store: wgpu::StoreOp::Store,
                                },
                                depth_slice: None,
                            })],
                            depth_stencil_attachment: Some(
                                wgpu::RenderPassDepthStencilAttachment {
                                    view: depth_view,
                                    depth_ops: Some(wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(1.0),
                                        store: wgpu::StoreOp::Store,
                                    }),
                                    stencil_ops: None,
                                },
                            ),
                            timestamp_writes: None,
                            occlusion_query_set: None,
                        });

                    scene.render(gpu, &mut render_pass, gpu.aspect(), time);
                }

                gpu.queue.submit(Some(encoder.finish()));
                output.present();

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
