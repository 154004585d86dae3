//! Application services for column ordering.

mod ordering;

pub use ordering::{OrderingError, OrderingResult, OrderingService};
