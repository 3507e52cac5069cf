// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Binding reflection.

A [`BindingReflector`] discovers the descriptor set and binding of every resource in a
module, together with the word offsets where those two numbers are encoded. The remap
engine in [`crate::bindings::binding_layout`] only needs this much.

Reflection is a pluggable capability. The crate ships [`SpirvReflector`], which scans the
module words directly; [`Unavailable`] stands in when no reflector can be provided and makes
every remap report [`ReflectError::Unavailable`]. Any function with the right signature is a
reflector too:

```
use shaders_and_bindings::reflect::{BindingPoint, BindingReflector, ReflectError};
use shaders_and_bindings::module::SpirvModuleView;

fn fixed(_module: SpirvModuleView<'_>) -> Result<Vec<BindingPoint>, ReflectError> {
    Ok(Vec::new())
}
let words = [0x0723_0203, 0x0001_0000, 0, 1, 0];
assert!(fixed.reflect_binding_points(SpirvModuleView::new(&words)).unwrap().is_empty());
```
*/

mod spirv;

pub use spirv::SpirvReflector;

use crate::module::{ModuleError, SpirvModuleView};

/// A resource binding found in a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingPoint {
    pub set: u32,
    pub binding: u32,
    /// Word offset of the literal holding `set`.
    pub set_word_offset: u32,
    /// Word offset of the literal holding `binding`.
    pub binding_word_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ReflectError {
    /// No reflector is available in this configuration.
    #[error("binding reflection is unavailable")]
    Unavailable,
    #[error(transparent)]
    Module(#[from] ModuleError),
    /// An external reflector failed for its own reasons.
    #[error("reflection failed: {reason}")]
    Failed { reason: String },
}

/// Discovers the binding points of a module.
pub trait BindingReflector {
    /// Returns the binding points in a deterministic order.
    fn reflect_binding_points(
        &self,
        module: SpirvModuleView<'_>,
    ) -> Result<Vec<BindingPoint>, ReflectError>;
}

impl<F> BindingReflector for F
where
    F: Fn(SpirvModuleView<'_>) -> Result<Vec<BindingPoint>, ReflectError>,
{
    fn reflect_binding_points(
        &self,
        module: SpirvModuleView<'_>,
    ) -> Result<Vec<BindingPoint>, ReflectError> {
        self(module)
    }
}

/// A reflector that is never available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unavailable;

impl BindingReflector for Unavailable {
    fn reflect_binding_points(
        &self,
        _module: SpirvModuleView<'_>,
    ) -> Result<Vec<BindingPoint>, ReflectError> {
        Err(ReflectError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ModuleBuilder;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn unavailable_always_fails() {
        let mut builder = ModuleBuilder::new();
        builder.uniform_block("Globals", 0, 0);
        let words = builder.build();
        assert_eq!(
            Unavailable.reflect_binding_points(SpirvModuleView::new(&words)),
            Err(ReflectError::Unavailable)
        );
    }

    #[test]
    fn reflectors_are_object_safe() {
        let words = ModuleBuilder::new().build();
        let reflectors: [&dyn BindingReflector; 2] = [&Unavailable, &SpirvReflector];
        let results: Vec<_> = reflectors
            .iter()
            .map(|r| r.reflect_binding_points(SpirvModuleView::new(&words)))
            .collect();
        assert!(results[0].is_err());
        assert_eq!(results[1], Ok(Vec::new()));
    }
}
