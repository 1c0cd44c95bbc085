use tracing::debug;

/// Resolve a credential value. A value starting with '$' is treated as an
/// environment variable reference; an unset variable falls back to the
/// literal.
pub fn resolve_credential(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved credential from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "Environment variable not set, using literal");
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_credential_literal() {
        assert_eq!(resolve_credential("sk-abc123"), "sk-abc123");
    }

    #[test]
    fn test_resolve_credential_env_reference() {
        std::env::set_var("TROUPE_TEST_KEY", "resolved-value");
        assert_eq!(resolve_credential("$TROUPE_TEST_KEY"), "resolved-value");
        std::env::remove_var("TROUPE_TEST_KEY");
    }

    #[test]
    fn test_resolve_credential_unset_env_keeps_literal() {
        assert_eq!(resolve_credential("$TROUPE_DEFINITELY_UNSET"), "$TROUPE_DEFINITELY_UNSET");
    }
}
