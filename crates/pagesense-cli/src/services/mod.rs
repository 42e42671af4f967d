// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — input discovery and pipeline construction for the batch driver.

pub mod inputs;
pub mod pipeline;
