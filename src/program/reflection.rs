// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Reflection descriptors for shaders and linked programs.

A [`ShaderReflection`] lists the resources a shader binds and, for vertex shaders, the
inputs it reads. A linked program merges the reflection of all its stages into one
descriptor.
*/
use crate::bindings::resource_view::ResourceView;
use crate::bindings::visible_to::ResourceType;
use crate::program::vertex_layout::VertexFieldType;

/// A vertex shader input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputAttribute {
    pub name: String,
    pub location: u32,
    /// `None` for types that can't be fed from a vertex buffer.
    pub field_type: Option<VertexFieldType>,
}

/// Everything reflection knows about a shader or a linked program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    pub resources: Vec<ResourceView>,
    pub vertex_inputs: Vec<InputAttribute>,
}

impl ShaderReflection {
    /// Adds `view`, or widens the stage flags of a view for the same resource.
    pub(crate) fn merge_resource(&mut self, view: &ResourceView) {
        match self.resources.iter_mut().find(|r| r.is_same_resource(view)) {
            Some(existing) => existing.stages |= view.stages,
            None => self.resources.push(view.clone()),
        }
    }

    pub fn find_resource(&self, name: &str, resource_type: ResourceType) -> Option<&ResourceView> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    pub fn find_vertex_input(&self, name: &str) -> Option<&InputAttribute> {
        self.vertex_inputs.iter().find(|a| a.name == name)
    }

    /// Sorts the resources into their canonical order; see [`finalize_resource_views`].
    pub fn finalize(&mut self) {
        finalize_resource_views(&mut self.resources);
    }
}

/**
Sorts resource views by resource type, then by slot, both in **descending** order.

The sort is stable. Consumers that bind resources by position depend on this exact order:

```
use shaders_and_bindings::bindings::resource_view::ResourceView;
use shaders_and_bindings::bindings::visible_to::ResourceType;
use shaders_and_bindings::program::reflection::finalize_resource_views;

let mut views = vec![
    ResourceView::new(ResourceType::Texture, 0),
    ResourceView::new(ResourceType::ConstantBuffer, 0),
    ResourceView::new(ResourceType::ConstantBuffer, 2),
];
finalize_resource_views(&mut views);
assert_eq!(views[0], ResourceView::new(ResourceType::ConstantBuffer, 2));
assert_eq!(views[2], ResourceView::new(ResourceType::Texture, 0));
```
*/
pub fn finalize_resource_views(views: &mut [ResourceView]) {
    views.sort_by(|lhs, rhs| {
        rhs.resource_type
            .cmp(&lhs.resource_type)
            .then(rhs.slot.cmp(&lhs.slot))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::visible_to::StageFlags;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn type_then_slot_descending() {
        let mut views = vec![
            ResourceView::new(ResourceType::Texture, 1),
            ResourceView::new(ResourceType::ConstantBuffer, 2),
            ResourceView::new(ResourceType::Texture, 0),
            ResourceView::new(ResourceType::ConstantBuffer, 0),
        ];
        finalize_resource_views(&mut views);
        let order: Vec<_> = views.iter().map(|v| (v.resource_type, v.slot)).collect();
        assert_eq!(
            order,
            vec![
                (ResourceType::ConstantBuffer, 2),
                (ResourceType::ConstantBuffer, 0),
                (ResourceType::Texture, 1),
                (ResourceType::Texture, 0),
            ]
        );
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut views = vec![
            ResourceView::new(ResourceType::Sampler, 3).with_name("b"),
            ResourceView::new(ResourceType::StorageBuffer, 3),
            ResourceView::new(ResourceType::Sampler, 3).with_name("a"),
        ];
        finalize_resource_views(&mut views);
        assert_eq!(views[0].resource_type, ResourceType::StorageBuffer);
        assert_eq!(views[1].name, "b");
        assert_eq!(views[2].name, "a");
    }

    #[test]
    fn merge_unions_stages() {
        let mut merged = ShaderReflection::default();
        let view = ResourceView::new(ResourceType::ConstantBuffer, 0).with_name("Globals");
        merged.merge_resource(&view.clone().with_stages(StageFlags::VERTEX));
        merged.merge_resource(&view.clone().with_stages(StageFlags::FRAGMENT));
        //same slot, different set: a different resource
        merged.merge_resource(&view.with_set(1).with_stages(StageFlags::FRAGMENT));
        assert_eq!(merged.resources.len(), 2);
        assert_eq!(
            merged.resources[0].stages,
            StageFlags::VERTEX | StageFlags::FRAGMENT
        );
        assert!(merged.find_resource("Globals", ResourceType::ConstantBuffer).is_some());
        assert!(merged.find_resource("Globals", ResourceType::Texture).is_none());
    }
}
