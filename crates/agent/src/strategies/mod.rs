//! Response strategies: one per recognized intent.

pub mod direct;
pub mod learn;
pub mod retrieval;

pub use direct::DirectAnswer;
pub use learn::LearnAndAcknowledge;
pub use retrieval::RetrievalAnswer;
