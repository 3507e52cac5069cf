// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! shaders_and_bindings composes shader stages into programs and remaps the resource
bindings encoded in their SPIR-V modules.

Shading languages let authors pick descriptor sets and binding numbers freely. Backends
are much stricter: bind groups must be dense, slots have limits, and several stages that
share a resource must agree on where it lives. This crate sits between the two.

# Binding remapping

[`bindings::binding_layout::BindingLayout`] records where each set and binding number is
stored in a module's word stream. Consumers assign new destinations, individually or as a
compacted run, and the layout patches them back into the module in place. Nothing else in
the module changes, so patching is cheap and can be repeated.

Finding the numbers in the first place is the job of a [`reflect::BindingReflector`]. The
crate ships [`reflect::SpirvReflector`], but any reflector can be plugged in.

# Programs

A [`program::Shader`] is one stage plus its reflection. A [`program::ShaderProgram`]
attaches shaders, checks that the stages make a valid pipeline, merges their reflection,
and links the result through the backend.

| State       | Reached by                         | Reflection available |
|-------------|------------------------------------|----------------------|
| Empty       | `new`, `detach_all`                | no                   |
| Composing   | `attach_shader`                    | no                   |
| Linked      | `link_shaders` returning `true`    | yes                  |
| LinkFailed  | `link_shaders` returning `false`   | no, see the info log |

# Backends

With the default `backend_wgpu` feature, linking produces [wgpu](https://wgpu.rs) bind group
layout entries and vertex buffer layouts, and the default [`limits::Limits`] are wgpu's. Without
it, a backend that only performs the generic checks is used.

# Testing

The `testing` feature exposes [`testing::ModuleBuilder`], which hand-assembles small SPIR-V
modules for fixtures.
*/

pub mod bindings;
pub mod limits;
pub mod module;
pub mod program;
pub mod reflect;
mod imp;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
