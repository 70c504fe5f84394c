pub mod engine;
pub mod nsga2;
pub mod operators;
pub mod pareto;
pub mod progress;

pub use engine::{
    create_engine, EngineParams, EngineState, EvolutionaryEngine, FitnessProblem, PopulationSnapshot,
};
pub use nsga2::Nsga2Engine;
pub use pareto::{FrontAnalyzer, FrontRanking};
pub use progress::{ChannelProgressCallback, LogProgressCallback, ProgressCallback, ProgressMessage};
