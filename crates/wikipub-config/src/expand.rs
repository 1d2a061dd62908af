//! `${VAR}` substitution in configuration values.
//!
//! `${VAR:-fallback}` uses `fallback` when `VAR` is unset or empty. Values
//! without a `${` sequence are taken literally, so secrets containing `$`
//! survive untouched.

use std::borrow::Cow;
use std::env::VarError;

use crate::ConfigError;

/// Substitute process environment variables into `value`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    expand_with(value, field, |name| std::env::var(name).map(Some))
}

/// Substitute into an optional value, leaving `None` alone.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    *value = value.as_deref().map(|v| expand_env(v, field)).transpose()?;
    Ok(())
}

/// Replace a leading `~` with the home directory.
pub(crate) fn expand_home(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

fn expand_with<F>(value: &str, field: &str, lookup: F) -> Result<String, ConfigError>
where
    F: FnMut(&str) -> Result<Option<String>, VarError>,
{
    if !value.contains("${") {
        return Ok(value.to_owned());
    }
    shellexpand::env_with_context(value, lookup)
        .map(Cow::into_owned)
        .map_err(|e| {
            let reason = match e.cause {
                VarError::NotPresent => "not set",
                VarError::NotUnicode(_) => "is not valid UTF-8",
            };
            ConfigError::EnvVar {
                field: field.to_owned(),
                message: format!("${{{}}} {reason}", e.var_name),
            }
        })
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use pretty_assertions::assert_eq;

    use super::*;

    fn site_env(name: &str) -> Result<Option<String>, VarError> {
        match name {
            "WIKI_HOST" => Ok(Some("wiki.example.com".to_owned())),
            "SPACE" => Ok(Some("DOCS".to_owned())),
            "BROKEN" => Err(VarError::NotUnicode(OsString::from("x"))),
            _ => Err(VarError::NotPresent),
        }
    }

    fn expand(value: &str) -> Result<String, ConfigError> {
        expand_with(value, "confluence.base_url", site_env)
    }

    #[test]
    fn test_variables_substituted_inside_text() {
        assert_eq!(
            expand("https://${WIKI_HOST}/wiki/${SPACE}").unwrap(),
            "https://wiki.example.com/wiki/DOCS"
        );
    }

    #[test]
    fn test_fallback_for_unset_variable() {
        assert_eq!(expand("${WIKI_PORT:-8090}").unwrap(), "8090");
        assert_eq!(expand("${SPACE:-OTHER}").unwrap(), "DOCS");
    }

    #[test]
    fn test_unset_variable_names_field_and_variable() {
        let err = expand("${WIKI_TOKEN}").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in confluence.base_url: ${WIKI_TOKEN} not set"
        );
    }

    #[test]
    fn test_non_unicode_variable_rejected() {
        let err = expand("${BROKEN}").unwrap_err();
        assert!(err.to_string().contains("${BROKEN} is not valid UTF-8"));
    }

    #[test]
    fn test_dollar_without_brace_is_literal() {
        assert_eq!(expand("s3cr$t$$").unwrap(), "s3cr$t$$");
    }

    #[test]
    fn test_optional_value() {
        let mut absent = None;
        expand_opt(&mut absent, "confluence.username").unwrap();
        assert_eq!(absent, None);

        let mut plain = Some("alice".to_owned());
        expand_opt(&mut plain, "confluence.username").unwrap();
        assert_eq!(plain.as_deref(), Some("alice"));
    }

    #[test]
    fn test_home_expansion_only_for_leading_tilde() {
        assert_eq!(expand_home("/etc/wikipub.toml"), "/etc/wikipub.toml");
        assert_eq!(expand_home("docs/~draft"), "docs/~draft");
    }
}
