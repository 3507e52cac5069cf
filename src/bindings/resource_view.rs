// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bindings::visible_to::{ResourceType, StageFlags};

/**
A resource as seen by reflection: what it is, and where it is bound.

Resource views are produced fresh by every reflection query and are never updated in place
afterwards.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceView {
    /// Name of the resource in the shader; may be empty for stripped modules.
    pub name: String,
    pub resource_type: ResourceType,
    /// Descriptor set (or register space).
    pub set: u32,
    /// Binding slot within the set.
    pub slot: u32,
    /// Stages that access the resource.
    pub stages: StageFlags,
    /// Number of array elements; 1 for a single resource, 0 for a runtime-sized array.
    pub array_size: u32,
}

impl ResourceView {
    /// A single, unnamed resource in set 0 that no stage claims yet.
    pub fn new(resource_type: ResourceType, slot: u32) -> Self {
        ResourceView {
            name: String::new(),
            resource_type,
            set: 0,
            slot,
            stages: StageFlags::empty(),
            array_size: 1,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_set(mut self, set: u32) -> Self {
        self.set = set;
        self
    }

    pub fn with_stages(mut self, stages: StageFlags) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    //views for the same resource seen from different stages
    pub(crate) fn is_same_resource(&self, other: &ResourceView) -> bool {
        self.resource_type == other.resource_type
            && self.set == other.set
            && self.slot == other.slot
            && self.name == other.name
    }
}
