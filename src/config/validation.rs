//! Configuration validation.
//!
//! # Responsibilities
//! - Normalize rules (singular/plural statement fields, default method)
//! - Semantic validation (serde handles syntactic)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::{GatewayConfig, RuleConfig};
use crate::db::connect::is_supported_driver;
use crate::routing::path::to_axum_path;
use crate::routing::rule::{Method, Rule};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Configuration that passed validation, with its rules normalized.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub settings: GatewayConfig,
    pub rules: Vec<Rule>,
}

/// Validate `config` and normalize its rules.
pub fn validate_config(config: GatewayConfig) -> Result<ValidatedConfig, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_supported_driver(&config.db.driver) {
        errors.push(ValidationError::new(
            "db.driver",
            format!("unsupported driver `{}`", config.db.driver),
        ));
    }
    if config.db.filepath.trim().is_empty() {
        errors.push(ValidationError::new("db.filepath", "must be set"));
    }
    if config.db.pool_size == 0 {
        errors.push(ValidationError::new("db.pool_size", "must be at least 1"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let rules = match normalize_rules(&config.rules) {
        Ok(rules) => rules,
        Err(rule_errors) => {
            errors.extend(rule_errors);
            Vec::new()
        }
    };

    if errors.is_empty() {
        Ok(ValidatedConfig {
            settings: config,
            rules,
        })
    } else {
        Err(errors)
    }
}

/// Normalize every rule, collecting the problems of all of them.
pub fn normalize_rules(inputs: &[RuleConfig]) -> Result<Vec<Rule>, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut rules = Vec::with_capacity(inputs.len());
    let mut seen = HashSet::new();
    let mut mounted_paths: Vec<String> = Vec::new();

    for (idx, input) in inputs.iter().enumerate() {
        match normalize_rule(idx, input) {
            Ok(rule) => {
                let conflict = mounted_paths.iter().find(|p| paths_conflict(p, &rule.path));
                if let Some(existing) = conflict {
                    errors.push(ValidationError::new(
                        format!("rules[{idx}]"),
                        format!("path `{}` conflicts with `{}`", rule.path, existing),
                    ));
                } else if !seen.insert((rule.method, to_axum_path(&rule.path))) {
                    errors.push(ValidationError::new(
                        format!("rules[{idx}]"),
                        format!("duplicate route {} {}", rule.method, rule.path),
                    ));
                } else if !mounted_paths.contains(&rule.path) {
                    mounted_paths.push(rule.path.clone());
                }
                rules.push(rule);
            }
            Err(rule_errors) => errors.extend(rule_errors),
        }
    }

    if errors.is_empty() {
        Ok(rules)
    } else {
        Err(errors)
    }
}

/// Turn one config rule into a [`Rule`].
pub fn normalize_rule(idx: usize, input: &RuleConfig) -> Result<Rule, Vec<ValidationError>> {
    let field = |name: &str| format!("rules[{idx}].{name}");
    let mut errors = Vec::new();

    let befores = pick_statements(&input.before, &input.befores, "before", "befores")
        .map_err(|m| errors.push(ValidationError::new(field("befores"), m)))
        .ok();
    let queries = pick_statements(&input.query, &input.queries, "query", "queries")
        .map_err(|m| errors.push(ValidationError::new(field("queries"), m)))
        .ok();
    let afters = pick_statements(&input.after, &input.afters, "after", "afters")
        .map_err(|m| errors.push(ValidationError::new(field("afters"), m)))
        .ok();

    if matches!(&queries, Some(q) if q.is_empty()) {
        errors.push(ValidationError::new(
            field("queries"),
            "at least one SQL query must be given per rule",
        ));
    }

    let method = input
        .method
        .parse::<Method>()
        .map_err(|e| errors.push(ValidationError::new(field("method"), e.to_string())))
        .ok();

    if let Err(message) = check_path(&input.path) {
        errors.push(ValidationError::new(field("path"), message));
    }

    match (befores, queries, afters, method) {
        (Some(befores), Some(queries), Some(afters), Some(method)) if errors.is_empty() => {
            Ok(Rule {
                path: input.path.clone(),
                method,
                befores,
                queries,
                afters,
                transaction: input.transaction,
            })
        }
        _ => Err(errors),
    }
}

fn pick_statements(
    single: &str,
    plural: &[String],
    single_name: &str,
    plural_name: &str,
) -> Result<Vec<String>, String> {
    match (single.is_empty(), plural.is_empty()) {
        (false, false) => Err(format!(
            "both of `{single_name}` and `{plural_name}` can't be defined in a rule"
        )),
        (false, true) => Ok(vec![single.to_string()]),
        (true, false) => Ok(plural.to_vec()),
        (true, true) => Ok(Vec::new()),
    }
}

fn is_param(segment: &str) -> bool {
    segment.starts_with(':') || segment.starts_with('*')
}

/// Two paths cannot be mounted side by side when, at the first segment
/// where they differ, both hold a parameter or catch-all.
fn paths_conflict(a: &str, b: &str) -> bool {
    a.split('/')
        .zip(b.split('/'))
        .find(|(x, y)| x != y)
        .is_some_and(|(x, y)| is_param(x) && is_param(y))
}

fn check_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("path `{path}` must start with `/`"));
    }
    let segments: Vec<&str> = path.split('/').collect();
    for (i, segment) in segments.iter().enumerate() {
        if *segment == ":" || *segment == "*" {
            return Err(format!("path `{path}` has an unnamed parameter"));
        }
        if segment.starts_with('*') && i + 1 != segments.len() {
            return Err(format!("path `{path}` has a catch-all before the last segment"));
        }
        if segment.contains(['{', '}']) {
            return Err(format!("path `{path}` must use `:name` parameters, not braces"));
        }
    }
    Ok(())
}
