// Copyright 2026 BadCompany
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

// Domain error types - raised at construction time, never mid-stream.

use thiserror::Error;

/// Main error type for the firewall.
///
/// Configuration errors are fatal before the proxy starts; a running proxy
/// fails open on malformed traffic instead of surfacing errors here.
#[derive(Error, Debug)]
pub enum WardenError {
    /// Invalid configuration document, rule, glob, or pattern
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failure to spawn or manage the wrapped server process
    #[error("Process error: {0}")]
    ProcessError(String),

    /// I/O error on the proxy's own streams
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
