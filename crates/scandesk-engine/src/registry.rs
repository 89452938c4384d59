//! Static metadata about actions.
//!
//! Whether an action needs operator input is a property of the action, not
//! of the engine. The registry answers that question and turns the
//! operator's answer into the transition's parameters.

use std::collections::HashMap;

use scandesk_core::types::{ActionId, ActionParams, PromptKind};

/// Check in to ReShare, asking for the item barcode.
pub const SUPPLIER_CHECK_IN: &str = "supplierCheckInToReshare";
/// Check in and mark shipped in one step, asking for the item barcode.
pub const SUPPLIER_CHECK_IN_AND_SHIP: &str = "supplierCheckInToReshareAndSupplierMarkShipped";

/// Per-action metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionSpec {
    /// Extra value the operator must supply before the transition runs.
    pub prompt: Option<PromptKind>,
}

/// Registry of action metadata, keyed by action id.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    specs: HashMap<ActionId, ActionSpec>,
}

impl ActionRegistry {
    /// Create an empty registry. Every action needs no prompt until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in actions that prompt for an item barcode.
    pub fn register_defaults(&mut self) {
        for action in [SUPPLIER_CHECK_IN, SUPPLIER_CHECK_IN_AND_SHIP] {
            self.register(
                ActionId::new(action),
                ActionSpec {
                    prompt: Some(PromptKind::ItemBarcode),
                },
            );
        }
    }

    pub fn register(&mut self, action: ActionId, spec: ActionSpec) {
        self.specs.insert(action, spec);
    }

    /// Metadata for `action`; unknown actions get the default (no prompt).
    pub fn spec(&self, action: &ActionId) -> ActionSpec {
        self.specs.get(action).copied().unwrap_or_default()
    }

    pub fn prompt_for(&self, action: &ActionId) -> Option<PromptKind> {
        self.spec(action).prompt
    }

    /// Transition parameters carrying the operator's answer to a `kind` prompt.
    pub fn params_for(kind: PromptKind, value: String) -> ActionParams {
        match kind {
            PromptKind::ItemBarcode => ActionParams(serde_json::json!({
                "itemBarcodes": [{ "itemId": value }]
            })),
        }
    }
}
