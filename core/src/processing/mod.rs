pub mod beam;
pub mod buffer_pool;
pub mod dispatch;
pub mod simulate;

pub use beam::{Beam, CosineBeam, GaussianBeam, UniformBeam};
pub use buffer_pool::BufferPool;
pub use dispatch::{ChosenPath, DispatchOptions, EvalPlan, EvalStrategy, VisibilityDispatcher};
pub use simulate::{
    simulate, simulate_vis, Precision, SimulationOptions, SimulationResult, SkyModel, VisOutput,
};
