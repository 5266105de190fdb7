//! Per-category request tokens for read refreshes.
//!
//! Every read takes a token when it is issued. A completion is applied
//! only if its token is newer than the last one applied for the same
//! category, so a slow response can never overwrite a fresher cache.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadKind {
    Bonds,
    Portfolio,
    MarketStats,
}

impl ReadKind {
    fn index(self) -> usize {
        match self {
            ReadKind::Bonds => 0,
            ReadKind::Portfolio => 1,
            ReadKind::MarketStats => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub kind: ReadKind,
    pub value: u64,
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: [AtomicU64; 3],
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, kind: ReadKind) -> RequestToken {
        let value = self.issued[kind.index()].fetch_add(1, Ordering::SeqCst) + 1;
        RequestToken { kind, value }
    }
}

/// Last token applied per category. Lives inside the guarded view state so
/// the check and the cache write happen under the same lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedTokens {
    applied: [u64; 3],
}

impl AppliedTokens {
    /// Record `token` as applied if it is newer than the last one
    pub fn accept(&mut self, token: RequestToken) -> bool {
        let slot = &mut self.applied[token.kind.index()];
        if token.value <= *slot {
            return false;
        }
        *slot = token.value;
        true
    }

    pub fn last(&self, kind: ReadKind) -> u64 {
        self.applied[kind.index()]
    }
}
