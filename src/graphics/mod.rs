pub mod engine;
pub mod feedback;
pub mod shader;
pub mod vertex;

pub use engine::GraphicsEngine;
pub use feedback::{FeedbackCompositor, PingPong};
pub use shader::{PipelineDesc, ShaderManager};
pub use vertex::{ParticleVertex, QuadVertex, VertexBuffer};
