pub mod catalog;
pub mod cross_sell;
pub mod mining;
pub mod query;
pub mod recorder;
pub mod substitute;

pub use cross_sell::{CrossSellRecommender, MAX_ITEMSET_SIZE};
pub use query::{QueryReport, RecommendationService};
pub use recorder::RecommendationRecorder;
pub use substitute::{SubstituteRecommender, DEFAULT_SUBSTITUTES};
