// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ew-worker: isolated-subprocess pool for `elm-watch-node` postprocess scripts.

pub mod errors;
pub mod pool;
pub mod worker;

pub use errors::WorkerError;
pub use pool::{CalculateMax, Pool};
pub use worker::{PostprocessRequest, PostprocessResponse, Worker, WorkerState};
