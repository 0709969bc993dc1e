pub mod log_record;
pub mod rule;
pub mod substitute;
pub mod transaction;

pub use log_record::{AssociationLogRecord, SubstituteLogRecord};
pub use rule::{AssociationRule, CrossSellOutcome, FormattedRule};
pub use substitute::{CatalogEntry, FallbackReason, Resolution, SubstituteOutcome, SubstituteRow};
pub use transaction::{TransactionRow, TransactionTable};
