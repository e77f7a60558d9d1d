// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reachability seam used by the watch scheduler.

use async_trait::async_trait;

/// Answers "is the print service reachable right now".
///
/// Implementations must never fail: every error collapses to `false`.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn probe(&self) -> bool;
}
