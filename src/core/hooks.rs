//! # Sequential hook execution.
//!
//! Both hook kinds run strictly left to right; each step is awaited before the next
//! starts and the first error stops the chain.

use crate::apps::{Hook, HookContext, HookPhase, LifecycleHook, LifecycleProps};
use crate::error::FrameworkError;

/// Runs host hooks of one phase.
pub(crate) async fn run_hooks(
    hooks: &[LifecycleHook],
    ctx: &HookContext,
    phase: HookPhase,
) -> Result<(), FrameworkError> {
    for hook in hooks {
        hook(ctx.clone())
            .await
            .map_err(|e| e.in_phase(&ctx.app_name, phase.as_str()))?;
    }
    Ok(())
}

/// Runs a parcel chain, handing every step the same props.
pub(crate) async fn run_chain(
    chain: &[Hook],
    props: &LifecycleProps,
    phase: &'static str,
) -> Result<(), FrameworkError> {
    for step in chain {
        step(props.clone())
            .await
            .map_err(|e| e.in_phase(&props.name, phase))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::apps::{lifecycle_fn, lifecycle_hook};
    use crate::host::ExecutionContext;

    #[tokio::test]
    async fn chain_stops_at_first_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let step = |tag: &'static str, fail: bool| {
            let log = Arc::clone(&log);
            lifecycle_fn(move |_| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().push(tag);
                    if fail {
                        Err(FrameworkError::hook("nope"))
                    } else {
                        Ok(())
                    }
                }
            })
        };
        let chain = vec![step("a", false), step("b", true), step("c", false)];
        let err = run_chain(&chain, &LifecycleProps::default(), "mount")
            .await
            .unwrap_err();

        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert_eq!(err.as_label(), "lifecycle_failed");
    }

    #[tokio::test]
    async fn hook_errors_name_the_phase() {
        let hooks = vec![lifecycle_hook(|_| async { Err(FrameworkError::hook("denied")) })];
        let ctx = HookContext {
            app_name: "react".into(),
            instance_id: "react_1".into(),
            global: ExecutionContext::new(),
            props: serde_json::Value::Null,
        };
        let err = run_hooks(&hooks, &ctx, HookPhase::BeforeLoad)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "before_load of 'react' failed: denied");
    }
}
