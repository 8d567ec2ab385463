//! Rule resolution
//!
//! A logger inherits every wildcard rule except those whose severity it
//! overrides with a rule of its own. Precedence is per severity: naming a
//! logger at `error` replaces only the wildcard `error` routing.

use crate::config::Rule;
use crate::core::{LoggerError, Result};

/// Effective rules of `logger_name`, in declaration order
///
/// # Errors
///
/// `LoggerError::NoRules` if nothing applies to the logger.
///
/// # Example
///
/// ```
/// use log_router::config::{default_rules, Rule};
/// use log_router::routing::resolve;
/// use log_router::LogLevel;
///
/// let mut rules = default_rules();
/// rules.push(Rule::new("payments", LogLevel::Error, "remote"));
///
/// let effective = resolve(&rules, "payments").unwrap();
/// assert_eq!(effective.len(), 3);
/// assert_eq!(effective[2].output_mode, "remote");
/// ```
pub fn resolve(rules: &[Rule], logger_name: &str) -> Result<Vec<Rule>> {
    let effective: Vec<Rule> = rules
        .iter()
        .filter(|rule| {
            if rule.logger_name.names(logger_name) {
                return true;
            }
            rule.logger_name.is_wildcard() && !overridden(rules, logger_name, rule)
        })
        .cloned()
        .collect();

    if effective.is_empty() {
        return Err(LoggerError::no_rules(logger_name));
    }
    Ok(effective)
}

fn overridden(rules: &[Rule], logger_name: &str, wildcard: &Rule) -> bool {
    rules
        .iter()
        .any(|rule| rule.logger_name.names(logger_name) && rule.level == wildcard.level)
}
