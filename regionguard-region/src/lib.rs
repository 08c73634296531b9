//! Protected regions for regionguard.
//!
//! A [`ProtectedRegion`] is a named shape with a priority, owner and member
//! [`DefaultDomain`]s, an optional parent and a map of marshalled flag
//! values. Parents are referenced by id and resolved through a
//! [`RegionGraph`], which is usually an index snapshot.
//!
//! Actors are supplied by the host through the [`Actor`] trait and are only
//! used to answer membership questions.

mod actor;
mod domain;
mod error;
mod graph;
mod region;

pub use actor::{Actor, PlayerActor};
pub use domain::{CustomDomain, DefaultDomain, DomainFactory, DomainRegistry, GroupDomain, PlayerDomain};
pub use error::{RegionError, RegionResult};
pub use graph::{ancestors, check_parent, Ancestors, RegionGraph};
pub use region::ProtectedRegion;

pub use regionguard_flags::Association;
