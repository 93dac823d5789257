//! Identifier grammars shared by actions, checks, values and units.

use regex::Regex;
use std::sync::OnceLock;

/// Longest permitted unit name, counted after the last `@` for instanced units.
pub const MAX_UNIT_NAME_LEN: usize = 256;

const NAME_PATTERN: &str = r"^[a-zA-Z_]+[a-zA-Z0-9_-]*$";

const UNIT_NAME_PATTERN: &str = r"^([a-zA-Z0-9:._-]+@)?[a-zA-Z0-9:._-]+(\.service|\.socket|\.device|\.mount|\.automount|\.swap|\.target|\.path|\.timer|\.slice|\.scope)$";

static NAME_RE: OnceLock<Regex> = OnceLock::new();
static UNIT_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(NAME_PATTERN).unwrap())
}

fn unit_name_re() -> &'static Regex {
    UNIT_NAME_RE.get_or_init(|| Regex::new(UNIT_NAME_PATTERN).unwrap())
}

pub fn is_valid_name(name: &str) -> bool {
    name_re().is_match(name)
}

pub fn is_valid_unit_name(unit: &str) -> bool {
    unit_name_re().is_match(unit)
}

/// The unit name without its instance prefix.
pub fn unit_suffix(unit: &str) -> &str {
    unit.rsplit('@').next().unwrap_or(unit)
}

pub fn unit_name_too_long(unit: &str) -> bool {
    unit_suffix(unit).len() > MAX_UNIT_NAME_LEN
}

/// Error message for a `kind` name that fails the name grammar.
pub fn name_mismatch(kind: &str, name: &str) -> String {
    format!("{kind} name {name:?} does not match format {NAME_PATTERN}")
}

pub fn unit_mismatch(unit: &str) -> String {
    format!("unit name {unit:?} does not match format {UNIT_NAME_PATTERN}")
}

pub fn unit_too_long() -> String {
    format!("unit name cannot exceed {MAX_UNIT_NAME_LEN} characters")
}
