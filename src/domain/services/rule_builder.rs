//! Rule Builder Service
//!
//! Pure domain logic turning bindings into flow rule descriptions.

use crate::domain::entities::{Binding, BindingKey, FlowRule};

/// Builds the flow rules that realize a binding on a switch.
pub struct RuleBuilder;

impl RuleBuilder {
    /// Rule installing a binding.
    ///
    /// Matches the ingress port and outputs to the primary egress port,
    /// then to the mirror port if one is set. Duplicate ports are kept.
    pub fn install_rule(binding: &Binding) -> FlowRule {
        let rule = FlowRule::matching(binding.inport).with_output(binding.outport);
        match binding.mirrorport {
            Some(mirror) => rule.with_output(mirror),
            None => rule,
        }
    }

    /// Rule removing a binding: match only, which deletes the whole
    /// rule including any mirror action.
    pub fn removal_rule(key: &BindingKey) -> FlowRule {
        FlowRule::matching(key.inport)
    }
}
