mod rule_builder;

pub use rule_builder::RuleBuilder;
