//! `$${name}` substitution in manifest strings.
//!
//! URLs, paths, CMake options and stage commands may mention values that only
//! exist once a [`crate::context::Context`] is built (`deps_dir`, `jobs`) or
//! once a package has been fetched or built (`src`, `build`). They are written
//! as `$${name}`, where `name` is ASCII letters, digits and underscores, and
//! looked up in a [`Vars`] table.
//!
//! A single `$` is left alone, so `$HOME` or `$(nproc)` reach the shell
//! untouched. `$$${` is the escape for a literal `$${`.
//!
//! ```
//! use nestpkg_lib::placeholder::{Vars, substitute};
//!
//! let vars = Vars::new().with("version", "1.15.2");
//! let url = substitute("https://example.com/v$${version}.tar.gz?$HOME", &vars).unwrap();
//! assert_eq!(url, "https://example.com/v1.15.2.tar.gz?$HOME");
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

/// One piece of a parsed manifest string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  /// Name inside a `$${...}`.
  Var(String),
}

/// Why a manifest string could not be expanded against a [`Vars`] table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  /// `$${` with no closing brace; holds the byte offset of the `$$`.
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("malformed placeholder: '{0}'")]
  Malformed(String),

  /// The name is well formed but the table has no value for it.
  #[error("unknown placeholder: '{0}'")]
  Unresolved(String),
}

/// Variable table for one substitution scope.
///
/// Built from the context's directory and toolchain values, then extended per
/// package and per stage. Setting a name again replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vars {
  values: BTreeMap<String, String>,
}

impl Vars {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder form of [`Vars::set`].
  pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
    self.set(name, value);
    self
  }

  pub fn set(&mut self, name: &str, value: impl Into<String>) {
    self.values.insert(name.to_string(), value.into());
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.values.get(name).map(String::as_str)
  }

  fn lookup(&self, name: &str) -> Result<&str, PlaceholderError> {
    self.get(name).ok_or_else(|| PlaceholderError::Unresolved(name.to_string()))
  }
}

fn is_var_name(name: &str) -> bool {
  !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split `input` into literal text and variable references.
///
/// Checks syntax only, so manifests can be validated before any variable
/// has a value.
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(at) = rest.find("$$") {
    literal.push_str(&rest[..at]);
    let offset = input.len() - rest.len() + at;
    let tail = &rest[at + 2..];

    if let Some(after) = tail.strip_prefix("${") {
      literal.push_str("$${");
      rest = after;
    } else if let Some(body) = tail.strip_prefix('{') {
      let close = body.find('}').ok_or(PlaceholderError::Unclosed(offset))?;
      let name = &body[..close];
      if !is_var_name(name) {
        return Err(PlaceholderError::Malformed(name.to_string()));
      }
      if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(&mut literal)));
      }
      segments.push(Segment::Var(name.to_string()));
      rest = &body[close + 1..];
    } else if let Some(after) = tail.strip_prefix('$') {
      literal.push_str("$$$");
      rest = after;
    } else {
      literal.push_str("$$");
      rest = tail;
    }
  }
  literal.push_str(rest);

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }
  Ok(segments)
}

/// Expand every `$${name}` in `input` from `vars`.
///
/// # Errors
///
/// Fails on bad syntax or on the first name `vars` has no value for.
pub fn substitute(input: &str, vars: &Vars) -> Result<String, PlaceholderError> {
  let mut out = String::with_capacity(input.len());
  for segment in parse(input)? {
    match segment {
      Segment::Literal(text) => out.push_str(&text),
      Segment::Var(name) => out.push_str(vars.lookup(&name)?),
    }
  }
  Ok(out)
}

/// [`substitute`] over a list, stopping at the first failure.
pub fn substitute_all(inputs: &[String], vars: &Vars) -> Result<Vec<String>, PlaceholderError> {
  inputs.iter().map(|input| substitute(input, vars)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn vars() -> Vars {
    Vars::new()
      .with("deps_dir", "/work/deps")
      .with("version", "20240722.0")
      .with("jobs", "8")
  }

  #[test]
  fn parse_plain_text() {
    assert_eq!(
      parse("cmake --build .").unwrap(),
      vec![Segment::Literal("cmake --build .".to_string())]
    );
  }

  #[test]
  fn parse_placeholder_between_literals() {
    assert_eq!(
      parse("make -j$${jobs} all").unwrap(),
      vec![
        Segment::Literal("make -j".to_string()),
        Segment::Var("jobs".to_string()),
        Segment::Literal(" all".to_string()),
      ]
    );
  }

  #[test]
  fn shell_variables_pass_through() {
    assert_eq!(substitute("echo $HOME $$PPID", &vars()).unwrap(), "echo $HOME $$PPID");
  }

  #[test]
  fn escape_produces_literal_placeholder() {
    assert_eq!(substitute("$$${jobs}", &vars()).unwrap(), "$${jobs}");
    assert_eq!(substitute("a$$$b", &vars()).unwrap(), "a$$$b");
    assert_eq!(substitute("$$$$${jobs}", &vars()).unwrap(), "$$$8");
  }

  #[test]
  fn substitute_multiple() {
    assert_eq!(
      substitute("$${deps_dir}/abseil-cpp-$${version}", &vars()).unwrap(),
      "/work/deps/abseil-cpp-20240722.0"
    );
  }

  #[test]
  fn unclosed_placeholder() {
    assert_eq!(parse("abc $${jobs"), Err(PlaceholderError::Unclosed(4)));
  }

  #[test]
  fn malformed_names() {
    assert_eq!(parse("$${}"), Err(PlaceholderError::Malformed(String::new())));
    assert_eq!(
      parse("$${build:out}"),
      Err(PlaceholderError::Malformed("build:out".to_string()))
    );
  }

  #[test]
  fn unknown_variable() {
    assert_eq!(
      substitute("$${prefix}/lib", &vars()),
      Err(PlaceholderError::Unresolved("prefix".to_string()))
    );
  }

  #[test]
  fn substitute_all_stops_on_first_error() {
    let inputs = vec!["-j$${jobs}".to_string(), "$${nope}".to_string()];
    assert!(substitute_all(&inputs, &vars()).is_err());
    assert_eq!(substitute_all(&inputs[..1], &vars()).unwrap(), vec!["-j8"]);
  }

  #[test]
  fn vars_later_values_replace_earlier() {
    let v = vars().with("jobs", "2");
    assert_eq!(v.get("jobs"), Some("2"));
  }
}
