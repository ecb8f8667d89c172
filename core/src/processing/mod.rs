pub mod cycle;
pub mod load;
pub mod validate;
pub mod window;

pub use cycle::{LoadCycle, LoadOutcome, LoadPhase, LoadToken, LOADING_MESSAGE};
pub use load::PointLoader;
pub use validate::{Normalized, Normalizer, RejectReason, Rejection};
pub use window::TimeWindow;
