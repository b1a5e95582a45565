//! Method and event names used on the control channel.

pub const SET_DISCOVER_TARGETS: &str = "Target.setDiscoverTargets";
pub const GET_TARGETS: &str = "Target.getTargets";
pub const ATTACH_TO_TARGET: &str = "Target.attachToTarget";
pub const DETACH_FROM_TARGET: &str = "Target.detachFromTarget";
pub const RUNTIME_ENABLE: &str = "Runtime.enable";
pub const RUNTIME_EVALUATE: &str = "Runtime.evaluate";

pub const TARGET_CREATED: &str = "Target.targetCreated";
pub const TARGET_DESTROYED: &str = "Target.targetDestroyed";
pub const DETACHED_FROM_TARGET: &str = "Target.detachedFromTarget";
pub const EXECUTION_CONTEXTS_CLEARED: &str = "Runtime.executionContextsCleared";
