//! `${VAR}` and `${VAR:-default}` expansion for config strings.
//!
//! Only the braced form is recognized; a bare `$` is kept as written, so
//! converter arguments and URLs with dollar signs pass through untouched.

use std::borrow::Cow;
use std::env::VarError;
use std::fmt;

use crate::ConfigError;

/// Expand variable references in `value`, naming `field` in errors.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, lookup)
        .map(Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: e.cause.to_string(),
        })
}

fn lookup(name: &str) -> Result<Option<String>, UnresolvedVar> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(reason) => Err(UnresolvedVar {
            name: name.to_owned(),
            reason,
        }),
    }
}

/// Variable that could not be read without a default to fall back on.
#[derive(Debug)]
struct UnresolvedVar {
    name: String,
    reason: VarError,
}

impl fmt::Display for UnresolvedVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let problem = match self.reason {
            VarError::NotPresent => "is not set",
            VarError::NotUnicode(_) => "is not valid unicode",
        };
        write!(f, "${{{}}} {problem}", self.name)
    }
}
