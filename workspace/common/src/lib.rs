//! Transport-layer types shared between the API handlers and the compute
//! engines: financial summaries, virtual subscription occurrences and batch
//! processing reports. These structs are plain data — no store access and no
//! business rules live here.

mod projection;
mod summary;

pub use projection::{ProcessingError, ProcessingReport, VirtualOccurrence};
pub use summary::{FinancialSummary, SummaryPeriod};
