// Copyright 2026 fedcache Project Authors
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

use std::{fmt::Debug, sync::Arc};

use fedcache_common::error::Error;

/// Decides which loader errors a cache ignores, i.e. returns to the caller without remembering them.
///
/// A remembered error is returned to later callers of the same key without calling the loader again, until the entry
/// is invalidated, evicted or expired.
#[derive(Clone)]
pub enum ErrorPolicy {
    /// Never remember errors. Every miss calls the loader.
    IgnoreAll,
    /// Remember only permanent errors (not found, already exists). Transient failures such as a database timeout
    /// are never remembered.
    IgnoreTransient,
    /// Ignore the errors for which the predicate returns `true`.
    Custom(Arc<dyn Fn(&Error) -> bool + Send + Sync + 'static>),
}

impl Debug for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IgnoreAll => write!(f, "IgnoreAll"),
            Self::IgnoreTransient => write!(f, "IgnoreTransient"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl ErrorPolicy {
    /// Build a [`ErrorPolicy::Custom`] policy.
    pub fn custom(f: impl Fn(&Error) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Whether `err` must not be remembered.
    pub fn ignores(&self, err: &Error) -> bool {
        match self {
            Self::IgnoreAll => true,
            Self::IgnoreTransient => !err.kind().is_permanent(),
            Self::Custom(f) => f(err),
        }
    }
}
