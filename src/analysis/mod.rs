//! Filtering and categorization over fetched records.
//!
//! Both passes are pure and borrow their input; neither can fail.

pub mod categorize;
pub mod filter;

pub use categorize::categorize;
pub use filter::{explain, filter_set, matches, Constraint};
