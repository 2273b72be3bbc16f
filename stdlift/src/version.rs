//! Go versions and the version gate.
//!
//! A rule only fires when the file's effective Go version is at least the
//! rule's minimum version. The effective version comes from the file's own
//! `//go:build` constraint, then from the owning module's `go` directive, and
//! is [`EffectiveVersion::Unbounded`] when neither is declared.

use std::fmt;
use std::str::FromStr;

/// Errors produced while parsing versions or build constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The version string was empty.
    #[error("empty Go version")]
    Empty,
    /// The version string is not of the form `go1.N[.P]`.
    #[error("invalid Go version `{0}`")]
    Invalid(String),
    /// A `//go:build` expression could not be parsed.
    #[error("invalid build constraint `{expr}`: {reason}")]
    Constraint {
        /// The offending expression.
        expr: String,
        /// What went wrong.
        reason: &'static str,
    },
}

/// Release stage of a Go version. Pre-releases sort before the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// `go1.21alpha1`
    Alpha(u32),
    /// `go1.21beta1`
    Beta(u32),
    /// `go1.21rc2`
    Rc(u32),
    /// A final release.
    Release,
}

/// A Go toolchain or language version.
///
/// Ordering is semantic: `go1.9 < go1.21 < go1.21.3`, and an absent patch
/// compares as `0`, so `go1.21 == go1.21.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GoVersion {
    /// Major version (always 1 in practice).
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version, 0 when absent.
    pub patch: u32,
    /// Release stage.
    pub stage: Stage,
}

impl GoVersion {
    /// Create a release version `major.minor`.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: 0,
            stage: Stage::Release,
        }
    }

    /// Whether this names a language line, `go1.21`, rather than a toolchain.
    #[must_use]
    pub const fn is_language(&self) -> bool {
        self.patch == 0 && matches!(self.stage, Stage::Release)
    }

    /// Create a release version `major.minor.patch`.
    #[must_use]
    pub const fn with_patch(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            stage: Stage::Release,
        }
    }
}

impl fmt::Display for GoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "go{}", self.major)?;
        if self.minor != 0 || self.patch != 0 || self.stage != Stage::Release {
            write!(f, ".{}", self.minor)?;
        }
        if self.patch != 0 {
            write!(f, ".{}", self.patch)?;
        }
        match self.stage {
            Stage::Alpha(n) => write!(f, "alpha{n}"),
            Stage::Beta(n) => write!(f, "beta{n}"),
            Stage::Rc(n) => write!(f, "rc{n}"),
            Stage::Release => Ok(()),
        }
    }
}

impl FromStr for GoVersion {
    type Err = VersionError;

    /// Accepts `go1`, `go1.21`, `go1.21.3`, `go1.21rc1` and the same forms
    /// without the `go` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let body = raw.strip_prefix("go").unwrap_or(raw);
        if body.is_empty() {
            return Err(VersionError::Empty);
        }
        let invalid = || VersionError::Invalid(raw.to_owned());

        let (numbers, stage) = match body.find(|c: char| c.is_ascii_alphabetic()) {
            Some(at) => (&body[..at], parse_stage(&body[at..]).ok_or_else(invalid)?),
            None => (body, Stage::Release),
        };

        let mut parts = numbers.split('.');
        let major = parse_number(parts.next()).ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(part) => parse_number(Some(part)).ok_or_else(invalid)?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(part) => parse_number(Some(part)).ok_or_else(invalid)?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            major,
            minor,
            patch,
            stage,
        })
    }
}

fn parse_number(part: Option<&str>) -> Option<u32> {
    let part = part?;
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn parse_stage(suffix: &str) -> Option<Stage> {
    let (ctor, digits): (fn(u32) -> Stage, &str) = if let Some(n) = suffix.strip_prefix("alpha")
    {
        (Stage::Alpha, n)
    } else if let Some(n) = suffix.strip_prefix("beta") {
        (Stage::Beta, n)
    } else if let Some(n) = suffix.strip_prefix("rc") {
        (Stage::Rc, n)
    } else {
        return None;
    };
    parse_number(Some(digits)).map(ctor)
}

/// The Go version a file is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveVersion {
    /// Declared by the file or its module.
    Declared(GoVersion),
    /// Nothing declared anywhere; treated as arbitrarily new.
    Unbounded,
}

impl EffectiveVersion {
    /// The file's own version wins over the module version.
    #[must_use]
    pub fn resolve(file: Option<GoVersion>, module: Option<GoVersion>) -> Self {
        file.or(module).map_or(Self::Unbounded, Self::Declared)
    }

    /// Whether code at this version may use something introduced in `min`.
    #[must_use]
    pub fn allows(self, min: GoVersion) -> bool {
        allows(self, min)
    }
}

impl fmt::Display for EffectiveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared(v) => write!(f, "{v}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Version gate: true iff `effective >= min`.
///
/// A bare language minimum such as `go1.21` is met by every toolchain of
/// that line, pre-releases included, so `go1.21rc1` passes it.
#[must_use]
pub fn allows(effective: EffectiveVersion, min: GoVersion) -> bool {
    match effective {
        EffectiveVersion::Declared(version) if min.is_language() => {
            (version.major, version.minor) >= (min.major, min.minor)
        }
        EffectiveVersion::Declared(version) => version >= min,
        EffectiveVersion::Unbounded => true,
    }
}

/// Returns the Go version implied by a file's `//go:build` line, if any.
///
/// Only the header before the `package` clause is inspected. A malformed
/// constraint is logged and ignored.
#[must_use]
pub fn file_build_version(source: &str) -> Option<GoVersion> {
    for line in source.lines() {
        let line = line.trim();
        if let Some(expr) = line.strip_prefix("//go:build") {
            if !expr.is_empty() && !expr.starts_with(char::is_whitespace) {
                continue;
            }
            return match build_constraint_version(expr) {
                Ok(version) => version,
                Err(err) => {
                    log::warn!("ignoring build constraint: {err}");
                    None
                }
            };
        }
        if line == "package" || line.starts_with("package ") {
            break;
        }
    }
    None
}

/// Evaluates a `//go:build` expression to the minimum Go version it implies.
///
/// `go1.N` tags yield their version, `&&` takes the larger side, `||` the
/// smaller (and nothing if either side has none), and negation yields nothing.
pub fn build_constraint_version(expr: &str) -> Result<Option<GoVersion>, VersionError> {
    let tokens = tokenize(expr)?;
    let mut parser = ConstraintParser {
        expr,
        tokens: &tokens,
        pos: 0,
    };
    let tree = parser.parse_or()?;
    if parser.pos != tokens.len() {
        return Err(parser.error("unexpected trailing tokens"));
    }
    Ok(tree.min_version(true))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Result<Vec<Token<'_>>, VersionError> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => {
                tokens.push(Token::And);
                i += 2;
            }
            b'|' if bytes.get(i + 1) == Some(&b'|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            b if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push(Token::Tag(&expr[start..i]));
            }
            _ => {
                return Err(VersionError::Constraint {
                    expr: expr.trim().to_owned(),
                    reason: "unexpected character",
                })
            }
        }
    }
    Ok(tokens)
}

enum Constraint<'a> {
    Tag(&'a str),
    Not(Box<Constraint<'a>>),
    And(Box<Constraint<'a>>, Box<Constraint<'a>>),
    Or(Box<Constraint<'a>>, Box<Constraint<'a>>),
}

impl Constraint<'_> {
    /// `positive` flips under negation, mirroring how `!(a || b)` distributes.
    fn min_version(&self, positive: bool) -> Option<GoVersion> {
        match self {
            Self::Tag(tag) => {
                if !positive {
                    return None;
                }
                go_tag_version(tag)
            }
            Self::Not(inner) => inner.min_version(!positive),
            Self::And(x, y) => {
                let (x, y) = (x.min_version(positive), y.min_version(positive));
                if positive {
                    and_version(x, y)
                } else {
                    or_version(x, y)
                }
            }
            Self::Or(x, y) => {
                let (x, y) = (x.min_version(positive), y.min_version(positive));
                if positive {
                    or_version(x, y)
                } else {
                    and_version(x, y)
                }
            }
        }
    }
}

fn and_version(x: Option<GoVersion>, y: Option<GoVersion>) -> Option<GoVersion> {
    match (x, y) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn or_version(x: Option<GoVersion>, y: Option<GoVersion>) -> Option<GoVersion> {
    match (x, y) {
        (Some(x), Some(y)) => Some(x.min(y)),
        _ => None,
    }
}

/// `go1.21` style release tags. Other tags, including `go1.21.3`, are not
/// language versions.
fn go_tag_version(tag: &str) -> Option<GoVersion> {
    let rest = tag.strip_prefix("go1.")?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok().map(|minor| GoVersion::new(1, minor))
}

struct ConstraintParser<'a, 't> {
    expr: &'a str,
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'a> ConstraintParser<'a, '_> {
    fn error(&self, reason: &'static str) -> VersionError {
        VersionError::Constraint {
            expr: self.expr.trim().to_owned(),
            reason,
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Result<Constraint<'a>, VersionError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Constraint::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Constraint<'a>, VersionError> {
        let mut left = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_not()?;
            left = Constraint::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Constraint<'a>, VersionError> {
        match self.peek().cloned() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(Constraint::Not(Box::new(self.parse_not()?)))
            }
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.peek() != Some(&Token::Close) {
                    return Err(self.error("missing closing parenthesis"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(Token::Tag(tag)) => {
                self.pos += 1;
                Ok(Constraint::Tag(tag))
            }
            Some(_) => Err(self.error("unexpected operator")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> GoVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(v("go1"), GoVersion::new(1, 0));
        assert_eq!(v("go1.21"), GoVersion::new(1, 21));
        assert_eq!(v("1.22.3"), GoVersion::with_patch(1, 22, 3));
        assert_eq!(v("go1.21rc1").stage, Stage::Rc(1));
        assert!("go".parse::<GoVersion>().is_err());
        assert!("go1.x".parse::<GoVersion>().is_err());
        assert!("go1.2.3.4".parse::<GoVersion>().is_err());
        assert!("go1.21beta".parse::<GoVersion>().is_err());
    }

    #[test]
    fn test_ordering_is_semantic() {
        assert!(v("go1.9") < v("go1.21"));
        assert!(v("go1.21") < v("go1.21.1"));
        assert_eq!(v("go1.21"), v("go1.21.0"));
        assert!(v("go1.21rc1") < v("go1.21"));
        assert!(v("go1.21beta2") < v("go1.21rc1"));
    }

    #[test]
    fn test_display_round_trips_common_forms() {
        assert_eq!(GoVersion::new(1, 0).to_string(), "go1");
        assert_eq!(GoVersion::new(1, 21).to_string(), "go1.21");
        assert_eq!(GoVersion::with_patch(1, 21, 4).to_string(), "go1.21.4");
        assert_eq!(v("go1.22rc2").to_string(), "go1.22rc2");
    }

    #[test]
    fn test_gate_is_monotonic() {
        let min = v("go1.21");
        for minor in 0..30 {
            let effective = EffectiveVersion::Declared(GoVersion::new(1, minor));
            assert_eq!(allows(effective, min), minor >= 21, "go1.{minor}");
        }
    }

    #[test]
    fn test_pre_release_meets_its_language_line() {
        let rc = EffectiveVersion::Declared(v("go1.21rc1"));
        assert!(rc.allows(v("go1.21")));
        assert!(!rc.allows(v("go1.22")));
        assert!(!rc.allows(v("go1.21.1")));
        assert!(EffectiveVersion::Declared(v("go1.22beta1")).allows(v("go1.21")));
    }

    #[test]
    fn test_unbounded_allows_everything() {
        assert!(EffectiveVersion::Unbounded.allows(v("go1.99")));
    }

    #[test]
    fn test_resolve_prefers_file_version() {
        let file = Some(v("go1.18"));
        let module = Some(v("go1.23"));
        assert_eq!(
            EffectiveVersion::resolve(file, module),
            EffectiveVersion::Declared(v("go1.18"))
        );
        assert_eq!(
            EffectiveVersion::resolve(None, module),
            EffectiveVersion::Declared(v("go1.23"))
        );
        assert_eq!(
            EffectiveVersion::resolve(None, None),
            EffectiveVersion::Unbounded
        );
    }

    #[test]
    fn test_build_constraints() {
        let c = |e: &str| build_constraint_version(e).unwrap();
        assert_eq!(c("go1.18"), Some(v("go1.18")));
        assert_eq!(c("linux && go1.21"), Some(v("go1.21")));
        assert_eq!(c("go1.20 && go1.22"), Some(v("go1.22")));
        assert_eq!(c("go1.20 || go1.22"), Some(v("go1.20")));
        assert_eq!(c("linux || go1.22"), None);
        assert_eq!(c("!go1.22"), None);
        assert_eq!(c("(darwin || linux) && go1.21"), Some(v("go1.21")));
        assert_eq!(c("!(!go1.19 || linux)"), Some(v("go1.19")));
        assert!(build_constraint_version("go1.21 &&").is_err());
        assert!(build_constraint_version("(go1.21").is_err());
    }

    #[test]
    fn test_file_build_version_reads_header_only() {
        let src = "//go:build go1.18\n\npackage test\n";
        assert_eq!(file_build_version(src), Some(v("go1.18")));

        let late = "package test\n\n//go:build go1.18\n";
        assert_eq!(file_build_version(late), None);

        let other = "//go:buildx go1.18\npackage test\n";
        assert_eq!(file_build_version(other), None);
    }
}
