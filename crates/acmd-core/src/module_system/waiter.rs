// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Callers waiting for a module that has not been defined yet

use crate::config::OrphanPolicy;
use crate::error::{ModuleError, Result};
use crate::module_system::module::Exports;
use crate::module_system::registry::ResolveFuture;
use futures::channel::oneshot;
use futures::future::{self, FutureExt};
use std::collections::VecDeque;
use tracing::debug;

/// FIFO queue of waiters registered under one key
#[derive(Default)]
pub(crate) struct WaiterQueue {
    waiters: VecDeque<oneshot::Sender<ResolveFuture>>,
}

impl WaiterQueue {
    /// Register a waiter
    pub(crate) fn push(&mut self) -> oneshot::Receiver<ResolveFuture> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(tx);
        rx
    }

    /// Append another queue, keeping its order
    pub(crate) fn append(&mut self, mut other: WaiterQueue) {
        self.waiters.append(&mut other.waiters);
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Hand each waiter, in registration order, its view of the resolution.
    ///
    /// Returns the number of waiters still listening.
    pub(crate) fn deliver(self, mut resolution: impl FnMut() -> ResolveFuture) -> usize {
        self.waiters
            .into_iter()
            .filter(|tx| !tx.is_canceled())
            .map(|tx| tx.send(resolution()).is_ok())
            .filter(|sent| *sent)
            .count()
    }
}

/// Future of a caller waiting on a definition of `module`
pub(crate) fn wait(
    rx: oneshot::Receiver<ResolveFuture>,
    module: String,
    policy: OrphanPolicy,
) -> ResolveFuture {
    async move {
        match rx.await {
            Ok(resolution) => resolution.await,
            Err(oneshot::Canceled) => orphaned(module, policy).await,
        }
    }
    .boxed()
}

/// Future of a caller whose registry generation was cleared before
/// `module` was defined
pub(crate) fn orphaned(module: String, policy: OrphanPolicy) -> ResolveFuture {
    match policy {
        OrphanPolicy::Pending => {
            debug!(module = %module, "Waiter orphaned by registry reset");
            future::pending::<Result<Exports>>().boxed()
        }
        OrphanPolicy::Reject => future::ready(Err(ModuleError::Abandoned { module })).boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_in_order() {
        let mut queue = WaiterQueue::default();
        let receivers: Vec<_> = (0..3).map(|_| queue.push()).collect();
        assert_eq!(queue.len(), 3);

        let mut next = 0;
        let delivered = queue.deliver(|| {
            next += 1;
            let exports = Exports::new();
            exports.set("order", next);
            future::ready(Ok(exports)).boxed()
        });
        assert_eq!(delivered, 3);

        for (i, mut rx) in receivers.into_iter().enumerate() {
            let resolution = rx.try_recv().unwrap().unwrap();
            let exports = resolution.now_or_never().unwrap().unwrap();
            assert_eq!(exports.get("order").and_then(|v| v.as_number()), Some((i + 1) as f64));
        }
    }

    #[test]
    fn test_dropped_waiters_are_skipped() {
        let mut queue = WaiterQueue::default();
        let kept = queue.push();
        drop(queue.push());

        let delivered = queue.deliver(|| future::ready(Ok(Exports::new())).boxed());
        assert_eq!(delivered, 1);
        drop(kept);
    }

    #[test]
    fn test_orphaned_waiter_policies() {
        let mut queue = WaiterQueue::default();
        let pending = wait(queue.push(), "m".into(), OrphanPolicy::Pending);
        let rejected = wait(queue.push(), "m".into(), OrphanPolicy::Reject);
        drop(queue);

        assert!(pending.now_or_never().is_none());
        let err = rejected.now_or_never().unwrap().unwrap_err();
        assert!(matches!(err, ModuleError::Abandoned { ref module } if module == "m"));
    }
}
