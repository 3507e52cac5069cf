// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Backend limits that linking and input layouts are checked against.
*/

/// Binding and attribute limits of the active backend.
///
/// The default values come from the backend selected at compile time. Use
/// [`ShaderProgram::with_limits`](crate::program::ShaderProgram::with_limits) to check
/// against a particular device instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
    /// Number of descriptor sets (bind groups); valid set indices are below this.
    pub max_descriptor_sets: u32,
    /// Valid binding indices within a set are below this.
    pub max_bindings_per_set: u32,
    pub max_vertex_attributes: u32,
}

impl Default for Limits {
    fn default() -> Self {
        crate::imp::default_limits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn defaults_are_usable() {
        let limits = Limits::default();
        assert!(limits.max_descriptor_sets >= 4);
        assert!(limits.max_bindings_per_set >= 16);
        assert!(limits.max_vertex_attributes >= 16);
    }
}
