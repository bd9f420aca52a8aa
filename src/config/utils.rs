use std::env;

/// Parse a boolean value from a string, supporting multiple formats
///
/// Accepts: "true", "false", "1", "0", "yes", "no" (case insensitive)
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// First non-empty value among `names`.
///
/// Used for variables that also have a legacy `NEXT_PUBLIC_` spelling from
/// the browser front end.
pub fn env_with_fallback(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Parse a numeric environment variable, naming it in the error.
pub fn parse_env_number<T>(name: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} environment variable: {e}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_bool_true_variants() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool(" Yes "), Some(true));
    }

    #[test]
    fn test_parse_bool_false_variants() {
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
    }

    #[test]
    fn test_parse_bool_invalid() {
        assert_eq!(parse_bool("invalid"), None);
        assert_eq!(parse_bool("2"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    #[serial]
    fn test_env_with_fallback_prefers_first_non_empty() {
        unsafe {
            env::set_var("PARLEY_TEST_PRIMARY", "");
            env::set_var("PARLEY_TEST_LEGACY", "legacy");
        }
        assert_eq!(
            env_with_fallback(&["PARLEY_TEST_PRIMARY", "PARLEY_TEST_LEGACY"]),
            Some("legacy".to_string())
        );

        unsafe {
            env::set_var("PARLEY_TEST_PRIMARY", "primary");
        }
        assert_eq!(
            env_with_fallback(&["PARLEY_TEST_PRIMARY", "PARLEY_TEST_LEGACY"]),
            Some("primary".to_string())
        );

        unsafe {
            env::remove_var("PARLEY_TEST_PRIMARY");
            env::remove_var("PARLEY_TEST_LEGACY");
        }
        assert_eq!(env_with_fallback(&["PARLEY_TEST_PRIMARY"]), None);
    }

    #[test]
    #[serial]
    fn test_parse_env_number() {
        unsafe {
            env::set_var("PARLEY_TEST_NUMBER", "42");
        }
        assert_eq!(parse_env_number::<u32>("PARLEY_TEST_NUMBER"), Ok(Some(42)));

        unsafe {
            env::set_var("PARLEY_TEST_NUMBER", "abc");
        }
        let err = parse_env_number::<u32>("PARLEY_TEST_NUMBER").unwrap_err();
        assert!(err.contains("PARLEY_TEST_NUMBER"));

        unsafe {
            env::remove_var("PARLEY_TEST_NUMBER");
        }
        assert_eq!(parse_env_number::<u32>("PARLEY_TEST_NUMBER"), Ok(None));
    }
}
