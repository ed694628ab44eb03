//! Grok-style pattern compiler.
//!
//! A `Format` is a named regex template containing `{IDENT}` placeholders
//! that refer to entries in the base pattern library (or an optional
//! per-compiler dictionary). `Compiler::compile` expands every placeholder
//! to a fixed point and compiles the result; `parse` and `parse_all` then
//! match input text against the compiled formats in declaration order.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::patterns::BASE_PATTERNS;

/// Placeholder expansion stops after this many rounds; a template that
/// still contains `{IDENT}` afterwards fails compilation.
const MAX_EXPANSION_ROUNDS: usize = 8;

/// Matches `{IDENT}` placeholders. Uppercase-led so regex repetition
/// counts like `\d{2,3}` are left alone.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").unwrap());

/// A named message format: a regex template plus the capture names the
/// format's consumers read back.
#[derive(Debug, Clone, Copy)]
pub struct Format {
    pub name: &'static str,
    pub pattern: &'static str,
    pub fields: &'static [&'static str],
}

#[derive(Debug)]
struct CompiledFormat {
    name: &'static str,
    fields: &'static [&'static str],
    regex: Regex,
}

/// One successful format match: which format hit, and the captured fields.
#[derive(Debug, Clone)]
pub struct GrokMatch {
    pub format_name: &'static str,
    pub captures: HashMap<&'static str, String>,
}

impl GrokMatch {
    /// Captured value for a field, if the group participated in the match.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.captures.get(field).map(String::as_str)
    }
}

/// A set of compiled formats. Immutable after construction; `parse` and
/// `parse_all` may be called concurrently.
#[derive(Debug)]
pub struct Compiler {
    formats: Vec<CompiledFormat>,
}

impl Compiler {
    /// Expand and compile every format. `locals` take precedence over the
    /// base pattern library. Fails on an empty format list, an unresolved
    /// placeholder, or a template that compiles to an invalid regex.
    pub fn compile(
        formats: &[Format],
        locals: Option<&HashMap<&'static str, &'static str>>,
    ) -> Result<Self> {
        if formats.is_empty() {
            bail!("no formats to compile");
        }

        let mut compiled = Vec::with_capacity(formats.len());
        for format in formats {
            let expanded = expand(format.pattern, locals)
                .with_context(|| format!("format {:?}", format.name))?;
            let regex = Regex::new(&expanded)
                .with_context(|| format!("format {:?} expands to invalid regex", format.name))?;
            compiled.push(CompiledFormat {
                name: format.name,
                fields: format.fields,
                regex,
            });
        }
        Ok(Self { formats: compiled })
    }

    /// Match against each format in declaration order; return the first hit.
    pub fn parse(&self, text: &str) -> Option<GrokMatch> {
        self.formats.iter().find_map(|f| f.try_match(text))
    }

    /// Match every format against the text; return all hits in declaration
    /// order. Used by decoders that compose several independent field
    /// extractors over the same body.
    pub fn parse_all(&self, text: &str) -> Vec<GrokMatch> {
        self.formats.iter().filter_map(|f| f.try_match(text)).collect()
    }
}

impl CompiledFormat {
    fn try_match(&self, text: &str) -> Option<GrokMatch> {
        let caps = self.regex.captures(text)?;
        let mut captures = HashMap::with_capacity(self.fields.len());
        for &field in self.fields {
            if let Some(m) = caps.name(field) {
                captures.insert(field, m.as_str().to_string());
            }
        }
        Some(GrokMatch {
            format_name: self.name,
            captures,
        })
    }
}

/// Substitute `{IDENT}` placeholders from `locals` then the base library,
/// repeating until no placeholders remain. Placeholders may expand to text
/// containing further placeholders.
fn expand(
    template: &str,
    locals: Option<&HashMap<&'static str, &'static str>>,
) -> Result<String> {
    let mut pattern = template.to_string();
    for _ in 0..MAX_EXPANSION_ROUNDS {
        if !PLACEHOLDER_RE.is_match(&pattern) {
            return Ok(pattern);
        }
        let mut missing: Option<String> = None;
        let replaced = PLACEHOLDER_RE.replace_all(&pattern, |caps: &regex::Captures| {
            let ident = caps.get(1).unwrap().as_str();
            let fragment = locals
                .and_then(|l| l.get(ident).copied())
                .or_else(|| BASE_PATTERNS.get(ident).copied());
            match fragment {
                Some(f) => f.to_string(),
                None => {
                    missing.get_or_insert_with(|| ident.to_string());
                    caps.get(0).unwrap().as_str().to_string()
                }
            }
        });
        if let Some(ident) = missing {
            bail!("unresolved placeholder {{{ident}}}");
        }
        pattern = replaced.into_owned();
    }
    bail!("placeholder expansion did not terminate after {MAX_EXPANSION_ROUNDS} rounds");
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[Format] = &[
        Format {
            name: "route",
            pattern: r"(?P<origin>{ICAO})-(?P<dest>{ICAO})",
            fields: &["origin", "dest"],
        },
        Format {
            name: "flight_only",
            pattern: r"(?P<flight>{FLIGHT})",
            fields: &["flight"],
        },
    ];

    #[test]
    fn test_compile_and_parse_first_match_wins() {
        let compiler = Compiler::compile(SIMPLE, None).unwrap();
        // Both formats could match; declaration order decides.
        let m = compiler.parse("EGLL-WSSS UAL123").unwrap();
        assert_eq!(m.format_name, "route");
        assert_eq!(m.get("origin"), Some("EGLL"));
        assert_eq!(m.get("dest"), Some("WSSS"));

        let m = compiler.parse("UAL123 departed").unwrap();
        assert_eq!(m.format_name, "flight_only");
        assert_eq!(m.get("flight"), Some("UAL123"));
    }

    #[test]
    fn test_parse_all_declaration_order() {
        let compiler = Compiler::compile(SIMPLE, None).unwrap();
        let matches = compiler.parse_all("EGLL-WSSS UAL123");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].format_name, "route");
        assert_eq!(matches[1].format_name, "flight_only");
    }

    #[test]
    fn test_local_dictionary_overrides_base() {
        let locals = HashMap::from([("ICAO", r"[A-Z]{3}")]);
        let formats = &[Format {
            name: "short",
            pattern: r"^(?P<code>{ICAO})$",
            fields: &["code"],
        }];
        let compiler = Compiler::compile(formats, Some(&locals)).unwrap();
        assert!(compiler.parse("JFK").is_some());
        assert!(compiler.parse("EGLL").is_none());
    }

    #[test]
    fn test_nested_expansion_reaches_fixed_point() {
        let locals = HashMap::from([("PAIR", r"{LAT_DIR}{LON_DIR}")]);
        let formats = &[Format {
            name: "pair",
            pattern: r"^{PAIR}$",
            fields: &[],
        }];
        let compiler = Compiler::compile(formats, Some(&locals)).unwrap();
        assert!(compiler.parse("NE").is_some());
        assert!(compiler.parse("EN").is_none());
    }

    #[test]
    fn test_unresolved_placeholder_fails() {
        let formats = &[Format {
            name: "bad",
            pattern: r"{NO_SUCH_PATTERN}",
            fields: &[],
        }];
        let err = Compiler::compile(formats, None).unwrap_err();
        assert!(err.to_string().contains("bad"), "{err:#}");
    }

    #[test]
    fn test_recursive_placeholder_fails() {
        let locals = HashMap::from([("LOOP", "{LOOP}")]);
        let formats = &[Format {
            name: "loop",
            pattern: r"{LOOP}",
            fields: &[],
        }];
        assert!(Compiler::compile(formats, Some(&locals)).is_err());
    }

    #[test]
    fn test_malformed_regex_fails() {
        let formats = &[Format {
            name: "broken",
            pattern: r"(?P<open>{ICAO}",
            fields: &["open"],
        }];
        assert!(Compiler::compile(formats, None).is_err());
    }

    #[test]
    fn test_empty_format_list_fails() {
        assert!(Compiler::compile(&[], None).is_err());
    }

    #[test]
    fn test_repetition_braces_untouched() {
        let formats = &[Format {
            name: "digits",
            pattern: r"^(?P<n>\d{2,3})$",
            fields: &["n"],
        }];
        let compiler = Compiler::compile(formats, None).unwrap();
        assert_eq!(compiler.parse("123").unwrap().get("n"), Some("123"));
        assert!(compiler.parse("1").is_none());
    }
}
