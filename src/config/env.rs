//! Environment accessor used by the resolver.
//!
//! Production reads the process environment; tests hand in a `HashMap` so
//! no global state is touched.

use std::collections::HashMap;

/// Read-only view over key/value settings. Empty values count as absent.
pub trait EnvSource {
    fn raw(&self, key: &str) -> Option<String>;

    fn get(&self, key: &str) -> Option<String> {
        self.raw(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// First non-empty value among `keys`, in order.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.get(k))
    }
}

/// The real process environment (after `.env` has been loaded by `main`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn raw(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn raw(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn blank_values_are_absent() {
        let e = env(&[("A", "  "), ("B", "")]);
        assert_eq!(EnvSource::get(&e, "A"), None);
        assert_eq!(EnvSource::get(&e, "B"), None);
        assert_eq!(EnvSource::get(&e, "C"), None);
    }

    #[test]
    fn values_are_trimmed() {
        let e = env(&[("A", " value\n")]);
        assert_eq!(EnvSource::get(&e, "A").as_deref(), Some("value"));
    }

    #[test]
    fn first_of_respects_order() {
        let e = env(&[("ALIAS", "second"), ("PRIMARY", "first")]);
        assert_eq!(e.first_of(&["PRIMARY", "ALIAS"]).as_deref(), Some("first"));
        assert_eq!(e.first_of(&["MISSING", "ALIAS"]).as_deref(), Some("second"));
        assert_eq!(e.first_of(&["MISSING"]), None);
    }
}
