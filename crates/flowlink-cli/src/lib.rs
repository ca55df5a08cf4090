// Copyright 2025 Flowlink Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Flowlink CLI
//!
//! Command-line front end for flowlink compute services.
//!
//! ## Key Commands
//!
//! - `flowlink post`: stream newline-delimited JSON requests and print the
//!   responses, over WebSocket or plain HTTP
//! - `flowlink health`: check whether the service answers on its root URL
//! - `flowlink info`: print the service's `/status` document
//!
//! Argument parsing and dispatch live in the binary; the request plumbing
//! shared with the tests lives in [`post`].

pub mod post;
