// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hfo-model: HTTP clients for the external AI model providers.
//!
//! The fabric treats providers as collaborators behind a narrow contract:
//! JSON endpoints that list models, generate text, and embed text. Every
//! outbound call carries an explicit deadline; failures map onto the
//! fault taxonomy so workers can back off instead of hanging.

mod error;
mod primary;
mod secondary;
mod text;

pub use error::ModelError;
pub use primary::{Generated, GenerateRequest, LoadedModel, PrimaryClient};
pub use secondary::SecondaryClient;
pub use text::{extract_json_array, strip_code_fences, strip_think_tags};
