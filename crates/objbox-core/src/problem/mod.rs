//! Black-box problems: the call contract, problem metadata, the factory
//! seam, and the compile-time catalog of directly-constructible problems.

mod aloha;
mod blackbox;
mod catalog;
mod info;
mod instance;
mod white_noise;

pub use aloha::AlohaFactory;
pub use blackbox::{
    AttributeRequest, AttributeValue, BlackBox, CreatedProblem, EvalContext, InputBatch,
    OutputBatch, ProblemFactory,
};
pub use catalog::{available_problems, factory_for};
pub use info::ProblemInfo;
pub use instance::BlackBoxInstance;
pub use white_noise::WhiteNoiseFactory;
