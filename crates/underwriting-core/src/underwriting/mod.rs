pub mod amortization;
pub mod inputs;
pub mod metrics;
pub mod model;
pub mod projection;
pub mod recommendation;
pub mod report;
pub mod sanitize;
pub mod snapshot;

pub use inputs::{
    CapexModel, ExpenseLine, ModelInputs, OpexModel, RecoveryModel, RentRollLine, RevenueModel,
};
pub use model::{run_model, underwrite_deal, ModelResult};
pub use recommendation::{RecommendationResult, Tone};
