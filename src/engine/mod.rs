pub mod mesh;
pub mod overlay;
pub mod renderer;
pub mod texture;
