//! Async award hook.
//!
//! The engine holds no durable state. Callers that must persist an updated
//! agent before its events become visible plug an [`AwardHook`] into
//! `ProgressionManager::process_xp_gain_with_hook`. If the hook fails,
//! nothing is committed and the error goes back to that caller only.

use std::future::Future;

use crate::error::HookError;
use crate::types::Agent;

/// Runs between computing an award and committing its events.
pub trait AwardHook: Send + Sync {
    /// Called with the updated agent snapshot.
    fn before_commit(
        &self,
        agent: &Agent,
    ) -> impl Future<Output = std::result::Result<(), HookError>> + Send;
}

/// A hook that always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl AwardHook for NoopHook {
    async fn before_commit(&self, _agent: &Agent) -> std::result::Result<(), HookError> {
        Ok(())
    }
}
