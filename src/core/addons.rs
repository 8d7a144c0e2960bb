//! # Built-in add-ons.
//!
//! Host hooks merged ahead of caller hooks on every load:
//! - engine flag: `__POWERED_BY_MICROVISOR__ = true` while the app is loaded/mounted
//! - public path: `__INJECTED_PUBLIC_PATH_BY_MICROVISOR__` = the entry's asset path,
//!   restored to its previous value before unmount

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::apps::{FrameworkLifecycles, HookPhase, lifecycle_hook};
use crate::host::GlobalValue;

pub const ENGINE_FLAG: &str = "__POWERED_BY_MICROVISOR__";
pub const PUBLIC_PATH_KEY: &str = "__INJECTED_PUBLIC_PATH_BY_MICROVISOR__";

/// Add-on hooks for one instance.
pub(crate) fn builtin(public_path: &str) -> FrameworkLifecycles {
    engine_flag().merge(&runtime_public_path(public_path))
}

fn engine_flag() -> FrameworkLifecycles {
    let set = || {
        lifecycle_hook(|ctx| async move {
            ctx.global.set_data(ENGINE_FLAG, true);
            Ok(())
        })
    };
    FrameworkLifecycles::new()
        .on(HookPhase::BeforeLoad, set())
        .on(HookPhase::BeforeMount, set())
        .on(
            HookPhase::BeforeUnmount,
            lifecycle_hook(|ctx| async move {
                ctx.global.remove(ENGINE_FLAG);
                Ok(())
            }),
        )
}

fn runtime_public_path(public_path: &str) -> FrameworkLifecycles {
    let path = Value::String(public_path.to_string());
    let raw: Arc<Mutex<Option<Option<GlobalValue>>>> = Arc::new(Mutex::new(None));

    let inject = {
        let raw = Arc::clone(&raw);
        move || {
            let raw = Arc::clone(&raw);
            let path = path.clone();
            lifecycle_hook(move |ctx| {
                let raw = Arc::clone(&raw);
                let path = path.clone();
                async move {
                    let previous = ctx.global.set(PUBLIC_PATH_KEY, GlobalValue::Data(path));
                    raw.lock().get_or_insert(previous);
                    Ok(())
                }
            })
        }
    };
    let restore = lifecycle_hook(move |ctx| {
        let raw = Arc::clone(&raw);
        async move {
            match raw.lock().clone().flatten() {
                Some(previous) => {
                    ctx.global.set(PUBLIC_PATH_KEY, previous);
                }
                None => {
                    ctx.global.remove(PUBLIC_PATH_KEY);
                }
            }
            Ok(())
        }
    });

    FrameworkLifecycles::new()
        .on(HookPhase::BeforeLoad, inject())
        .on(HookPhase::BeforeMount, inject())
        .on(HookPhase::BeforeUnmount, restore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::HookContext;
    use crate::core::hooks::run_hooks;
    use crate::host::ExecutionContext;

    fn ctx(global: &ExecutionContext) -> HookContext {
        HookContext {
            app_name: "react".into(),
            instance_id: "react_1".into(),
            global: global.clone(),
            props: Value::Null,
        }
    }

    #[tokio::test]
    async fn flags_live_between_load_and_unmount() {
        let global = ExecutionContext::new();
        global.set_data(PUBLIC_PATH_KEY, "/host/");
        let hooks = builtin("//cdn/react/");
        let ctx = ctx(&global);

        run_hooks(hooks.hooks(HookPhase::BeforeLoad), &ctx, HookPhase::BeforeLoad)
            .await
            .unwrap();
        assert_eq!(global.data(ENGINE_FLAG), Some(Value::Bool(true)));
        assert_eq!(global.data(PUBLIC_PATH_KEY), Some(Value::from("//cdn/react/")));

        run_hooks(hooks.hooks(HookPhase::BeforeMount), &ctx, HookPhase::BeforeMount)
            .await
            .unwrap();
        run_hooks(hooks.hooks(HookPhase::BeforeUnmount), &ctx, HookPhase::BeforeUnmount)
            .await
            .unwrap();
        assert!(!global.contains(ENGINE_FLAG));
        assert_eq!(global.data(PUBLIC_PATH_KEY), Some(Value::from("/host/")));
    }
}
