// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagesense — Core types, configuration and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::PipelineConfig;
pub use error::{PagesenseError, Result};
pub use types::*;
