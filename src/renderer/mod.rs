//! WebGPU rendering module
//!
//! The scene builder turns a `GameState` into flat-colored triangles in
//! viewport pixels; the pipeline maps them to clip space and draws them.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use scene::{Frame, build_scene};
pub use vertex::Vertex;
