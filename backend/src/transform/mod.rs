//! Transformation module.
//!
//! - Normalize: compound key to dimension columns
//! - Reshape: wide to long
//! - Coerce: raw text to numbers
//! - Filter: dimension allow-sets and view-level exclusion
//! - Aggregate: grouped statistics and pivots
//! - Pipeline: composition of all of the above

pub mod aggregate;
pub mod coerce;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod reshape;

pub use aggregate::{aggregate, distribution, pivot, DistributionSummary};
pub use coerce::{coerce, Coerce};
pub use filter::{domain, domains, filter, ExclusionPolicy, Keyed, Selection};
pub use normalize::normalize;
pub use pipeline::*;
pub use reshape::{sort_periods, to_long_form};
