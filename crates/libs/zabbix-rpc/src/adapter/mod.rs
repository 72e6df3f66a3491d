//! Version-specific wire strategies.
//!
//! Each strategy is chosen once per version change from the negotiated
//! [`WireGeneration`]; nothing else in the crate branches on version numbers.

mod hosts;
mod items;

pub use hosts::HostAdapter;
pub use items::ItemAdapter;

use crate::version::WireGeneration;

/// The strategies in force for one negotiated server version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterSet {
    pub items: ItemAdapter,
    pub hosts: HostAdapter,
}

impl AdapterSet {
    pub fn for_generation(generation: WireGeneration) -> Self {
        Self {
            items: ItemAdapter::for_generation(generation),
            hosts: HostAdapter::for_generation(generation),
        }
    }

    pub fn generation(&self) -> WireGeneration {
        self.items.generation()
    }
}
