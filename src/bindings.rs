// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Defines binding types */

pub mod binding_layout;
pub mod resource_view;
pub mod visible_to;

pub use binding_layout::{BindingLayout, BindingSlot, remap_module};
