// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::fmt::Display;

use crate::program::ShaderStage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    UnsupportedStage(ShaderStage),
    RuntimeArray { set: u32, binding: u32 },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnsupportedStage(stage) => write!(f, "wgpu has no {} stage", stage),
            Error::RuntimeArray { set, binding } => write!(
                f,
                "set {} binding {} is a runtime-sized array, which wgpu can't bind",
                set, binding
            ),
        }
    }
}
