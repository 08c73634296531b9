//! Flag resolution for regionguard.
//!
//! Given the regions that apply at a point, this crate:
//! - sorts them into normative order ([`normative_order`])
//! - works out how a subject relates to them ([`RegionAssociable`])
//! - computes the effective value of a flag ([`FlagValueCalculator`])
//!
//! [`ApplicableRegionSet`] bundles all three behind one query surface.

mod association;
mod calculator;
mod order;
mod result_set;

pub use association::{association_of, ConstantAssociation, RegionAssociable, RegionOverlapAssociation};
pub use calculator::{FlagValueCalculator, Membership};
pub use order::{normative_order, OrderedRegion};
pub use result_set::{ApplicableRegionSet, SharedGraph};
