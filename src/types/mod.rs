//! Core domain types for the deal gateway.

pub mod click;
pub mod deal;
pub mod ids;

pub use click::ClickEvent;
pub use deal::{Deal, Deals, PackageTier};
pub use ids::{ClickId, DealId};
