//! Active hook set: built while plugins are loaded, frozen afterwards.

use serde::Serialize;

use crate::abi::{HookOrigin, NumericToTextualHook, TextualToNumericHook};

/// Hooks contributed by a single plugin. Either direction may be missing.
#[derive(Debug, Default)]
pub struct PluginHooks {
    pub numeric_to_textual: Option<NumericToTextualHook>,
    pub textual_to_numeric: Option<TextualToNumericHook>,
}

impl PluginHooks {
    pub fn is_empty(&self) -> bool {
        self.numeric_to_textual.is_none() && self.textual_to_numeric.is_none()
    }
}

/// Mutable hook set used during initialization.
#[derive(Debug, Default)]
pub struct HookSetBuilder {
    hooks: PluginHooks,
}

impl HookSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install every hook in `hooks`, replacing any hook of the same
    /// direction installed earlier. Directions `hooks` lacks are untouched.
    pub fn overlay(&mut self, hooks: PluginHooks) -> &mut Self {
        if let Some(hook) = hooks.numeric_to_textual {
            if let Some(previous) = &self.hooks.numeric_to_textual {
                tracing::debug!(
                    "numeric to textual hook from {} replaces {}",
                    hook.origin(),
                    previous.origin()
                );
            }
            self.hooks.numeric_to_textual = Some(hook);
        }
        if let Some(hook) = hooks.textual_to_numeric {
            if let Some(previous) = &self.hooks.textual_to_numeric {
                tracing::debug!(
                    "textual to numeric hook from {} replaces {}",
                    hook.origin(),
                    previous.origin()
                );
            }
            self.hooks.textual_to_numeric = Some(hook);
        }
        self
    }

    /// Freeze the set. The result has no mutating API.
    pub fn freeze(self) -> ActiveHookSet {
        ActiveHookSet {
            numeric_to_textual: self.hooks.numeric_to_textual,
            textual_to_numeric: self.hooks.textual_to_numeric,
        }
    }
}

/// The hooks consulted by the resolver.
#[derive(Debug, Default)]
pub struct ActiveHookSet {
    numeric_to_textual: Option<NumericToTextualHook>,
    textual_to_numeric: Option<TextualToNumericHook>,
}

impl ActiveHookSet {
    /// A set with no hooks; every request goes to the native backend.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn numeric_to_textual(&self) -> Option<&NumericToTextualHook> {
        self.numeric_to_textual.as_ref()
    }

    pub fn textual_to_numeric(&self) -> Option<&TextualToNumericHook> {
        self.textual_to_numeric.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.numeric_to_textual.is_none() && self.textual_to_numeric.is_none()
    }

    /// Which source provides each direction.
    pub fn describe(&self) -> HookSummary {
        HookSummary {
            numeric_to_textual: self.numeric_to_textual.as_ref().map(|h| h.origin().clone()),
            textual_to_numeric: self.textual_to_numeric.as_ref().map(|h| h.origin().clone()),
        }
    }
}

/// Serializable view of an [`ActiveHookSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookSummary {
    pub numeric_to_textual: Option<HookOrigin>,
    pub textual_to_numeric: Option<HookOrigin>,
}
