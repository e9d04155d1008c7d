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

use std::time::Duration;

/// Pause between two attempts of [`try_until`].
pub const RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Call `f` until it returns `true`, at most `count` times.
///
/// # Panics
///
/// Panics with `what` if every attempt fails. Used for startup and shutdown steps where a persistent failure leaves
/// the process in a state it cannot run in.
pub fn try_until(what: &str, count: usize, f: impl FnMut() -> bool) {
    try_until_with_interval(what, count, RETRY_INTERVAL, f)
}

/// Same as [`try_until`], with a custom pause between attempts.
pub fn try_until_with_interval(what: &str, count: usize, interval: Duration, mut f: impl FnMut() -> bool) {
    for attempt in 1..=count {
        if f() {
            return;
        }
        tracing::warn!(what, attempt, count, "[retry]: attempt failed");
        if attempt < count {
            std::thread::sleep(interval);
        }
    }
    panic!("failed {what} after {count} tries");
}
