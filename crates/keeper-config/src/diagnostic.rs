// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with "did you mean?" suggestions.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with diagnostic information for miette rendering.
///
/// Variants carry what miette needs to point at the offending line of
/// `keeper.toml` and to offer a correction.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section of `KeeperConfig` declares.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(keeper::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The key as written.
        key: String,
        /// Closest valid key by Jaro-Winkler similarity, if close enough.
        suggestion: Option<String>,
        /// Comma-separated keys the enclosing section accepts.
        valid_keys: String,
        /// Location of the key in the TOML source, when it came from a file.
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        /// The TOML file the key was found in.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into its field's type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(keeper::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path of the key, e.g. `vault.kdf_iterations`.
        key: String,
        /// Figment's description of the mismatch.
        detail: String,
        /// The type the field expects.
        expected: String,
    },

    /// A key with no default that no source provided.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(keeper::config::missing_key),
        help("add `{key} = <value>` to keeper.toml or set the matching KEEPER_* variable")
    )]
    MissingKey {
        /// Dotted path of the missing key.
        key: String,
    },

    /// A well-typed value outside its allowed range.
    #[error("validation error: {message}")]
    #[diagnostic(code(keeper::config::validation))]
    Validation {
        /// What is wrong and which bound it violates.
        message: String,
    },

    /// Any other figment failure, such as an unreadable file.
    #[error("configuration error: {0}")]
    #[diagnostic(code(keeper::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` (which may carry several errors) into diagnostics.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let (span, src) = locate_key(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid_keys),
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Resolve the span of `field` in whichever TOML file the error came from.
fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline sources have no file metadata; fall back to the only source.
    let source = match origin {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((path, content)) = source else {
        return (None, None);
    };

    match find_key_offset(content, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside the `[section]` named by `path[0]`, or from
/// the top of the file when `path` is empty.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let section_start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = section_start;
    for line in content[section_start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best Jaro-Winkler match above [`SUGGESTION_THRESHOLD`], if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_token_secret_for_typo() {
        let valid = &["token_secret", "token_ttl_secs"];
        assert_eq!(
            suggest_key("token_secert", valid),
            Some("token_secret".to_string())
        );
    }

    #[test]
    fn suggests_master_key_for_typo() {
        let valid = &["master_key", "kdf_memory_cost", "kdf_iterations", "kdf_parallelism"];
        assert_eq!(suggest_key("mastr_key", valid), Some("master_key".to_string()));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["database_path", "wal_mode"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[storage]\nwal_mode = true\n\n[auth]\ntoken_secert = \"x\"\n";
        let path = vec!["auth".to_string()];
        let offset = find_key_offset(content, &path, "token_secert").unwrap();
        assert_eq!(&content[offset..offset + 12], "token_secert");
    }

    #[test]
    fn find_key_offset_ignores_prefix_matches() {
        let content = "[vault]\nmaster_key_file = 1\nmaster_key = \"ab\"\n";
        let path = vec!["vault".to_string()];
        let offset = find_key_offset(content, &path, "master_key").unwrap();
        assert_eq!(&content[offset..offset + 13], "master_key = ");
    }

    #[test]
    fn unknown_field_becomes_unknown_key_with_suggestion() {
        let toml = "[auth]\ntoken_secert = \"x\"\n";
        let err = crate::loader::load_config_from_str(toml).unwrap_err();
        let sources = vec![("<inline>".to_string(), toml.to_string())];
        let errors = figment_to_config_errors(err, &sources);
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                if key == "token_secert" && s == "token_secret"
        )));
    }
}
