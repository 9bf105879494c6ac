//! # Helion
//!
//! **An interactive physically-based model viewer with image-based lighting.**
//!
//! Point it at an OBJ model, a set of material maps, and an HDR panorama,
//! and orbit around the result. Every asset is optional: missing models
//! become a cube, missing textures become white, and a missing panorama
//! becomes a flat sky.
//!
//! ## Quick Start
//!
//! ```no_run
//! use helion::{ViewerConfig, run};
//!
//! fn main() {
//!     env_logger::init();
//!
//!     let config = ViewerConfig::new()
//!         .title("My Viewer")
//!         .model("assets/helmet.obj")
//!         .panorama("assets/studio.hdr");
//!
//!     run(config);
//! }
//! ```
//!
//! ## What happens at startup
//!
//! - The OBJ model is imported, recentered, and given a tangent basis.
//! - The HDR panorama is projected onto an environment cubemap, which is
//!   then convolved into a diffuse irradiance cubemap.
//! - Each frame draws the model with Cook-Torrance shading and the
//!   environment as a slowly rotating skybox behind it.
//!
//! Left-drag orbits the camera, right-drag rotates the model. Keys 1-5
//! toggle the material maps, 6 toggles image-based lighting.

mod app;
mod environment;
mod geometry;
mod gpu;
mod input;
mod mesh;
mod orbit_camera;
mod pbr_pass;
mod scene;
mod shaders;
mod shading;
mod skybox;
mod texture;

pub use app::{ViewerConfig, run};
pub use environment::{Cubemap, convolve_irradiance, face_projection, face_views, project_panorama};
pub use geometry::{GeometryError, MeshData, Vertex};
pub use gpu::GpuContext;
pub use input::Input;
pub use mesh::Mesh;
pub use orbit_camera::OrbitCamera;
pub use pbr_pass::{MaterialMaps, PbrPass};
pub use scene::{TextureSlot, ViewerScene, drag_model, model_rotation};
pub use shading::{
    DIELECTRIC_F0, LightKind, LightingUniforms, MaterialUniforms, ShadingParams,
    TransformUniforms, animated_light_direction,
};
pub use skybox::{SkyboxPass, sky_view};
pub use texture::{DecodedImage, Texture};

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
