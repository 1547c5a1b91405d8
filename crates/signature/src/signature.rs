use crate::error::{Result, SignatureError};
use crate::normalize::CanonicalSignature;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of source-code entity a signature targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Class,
    Interface,
    Struct,
    Enum,
    Trait,
    Function,
    Module,
    /// Plain data export (a constant, an object literal, ...)
    Value,
    Any,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Class => "class",
            TargetKind::Interface => "interface",
            TargetKind::Struct => "struct",
            TargetKind::Enum => "enum",
            TargetKind::Trait => "trait",
            TargetKind::Function => "function",
            TargetKind::Module => "module",
            TargetKind::Value => "value",
            TargetKind::Any => "any",
        }
    }

    /// Whether a requested kind accepts a candidate kind
    pub fn accepts(self, candidate: TargetKind) -> bool {
        self == TargetKind::Any || self == candidate
    }
}

impl Default for TargetKind {
    fn default() -> Self {
        TargetKind::Any
    }
}

/// Compiled name pattern, serialized by source + flags (never by the
/// compiled automaton) so canonical forms stay deterministic.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    flags: String,
    regex: Regex,
    /// `^(?:source)$`, so a full match is found even when the leftmost
    /// alternative would only cover a prefix
    anchored: Regex,
}

impl NamePattern {
    /// Compile a pattern. Supported flags: `i`, `m`, `s`, `x`, `u`.
    pub fn new(source: impl Into<String>, flags: &str) -> Result<Self> {
        let source = source.into();
        for flag in flags.chars() {
            if !matches!(flag, 'i' | 'm' | 's' | 'x' | 'u') {
                return Err(SignatureError::UnsupportedFlag {
                    flag,
                    flags: flags.to_string(),
                });
            }
        }
        let regex = Self::compile(&source, flags)?;
        let anchored = Self::compile(&format!("^(?:{source})$"), flags)?;

        let mut normalized: Vec<char> = flags.chars().collect();
        normalized.sort_unstable();
        normalized.dedup();

        Ok(Self {
            source,
            flags: normalized.into_iter().collect(),
            regex,
            anchored,
        })
    }

    fn compile(pattern: &str, flags: &str) -> Result<Regex> {
        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                // Unicode mode is the regex crate default.
                _ => {}
            }
        }
        builder.build().map_err(|e| SignatureError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Pattern covers the entire name
    pub fn matches_full(&self, name: &str) -> bool {
        self.anchored.is_match(name)
    }

    /// Pattern matches somewhere inside the name
    pub fn matches_partial(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Desired name: a literal (compared case-insensitively) or a pattern
#[derive(Debug, Clone)]
pub enum NameQuery {
    Exact(String),
    Pattern(NamePattern),
}

impl NameQuery {
    pub fn exact(name: impl Into<String>) -> Self {
        NameQuery::Exact(name.into())
    }

    pub fn pattern(source: impl Into<String>, flags: &str) -> Result<Self> {
        Ok(NameQuery::Pattern(NamePattern::new(source, flags)?))
    }
}

/// Immutable structural query describing the entity to find.
///
/// Unset fields constrain nothing; list-valued fields require every listed
/// entry to be present on the target. Comparisons are case-insensitive, the
/// canonical form preserves the original case.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub name: Option<NameQuery>,
    pub kind: TargetKind,
    pub methods: Vec<String>,
    pub fields: Vec<String>,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub annotations: Vec<String>,
    pub namespace: Option<String>,
    pub generics: Vec<String>,
    /// Language-specific extension fields, consumed by integration hooks
    pub extensions: BTreeMap<String, String>,
}

impl Signature {
    /// Signature matching an exact name with no other constraints
    pub fn of(name: impl Into<String>) -> Self {
        Self {
            name: Some(NameQuery::exact(name)),
            ..Default::default()
        }
    }

    /// Signature matching a name pattern with no other constraints
    pub fn matching(source: impl Into<String>, flags: &str) -> Result<Self> {
        Ok(Self {
            name: Some(NameQuery::pattern(source, flags)?),
            ..Default::default()
        })
    }

    pub fn kind(mut self, kind: TargetKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn implements<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implements = interfaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn annotations<I, S>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotations = annotations.into_iter().map(Into::into).collect();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn generics<I, S>(mut self, generics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generics = generics.into_iter().map(Into::into).collect();
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Canonical, deterministic form of this signature
    pub fn canonical(&self) -> CanonicalSignature {
        CanonicalSignature::from_signature(self)
    }

    /// Cache key: compact JSON of the canonical form
    pub fn cache_key(&self) -> String {
        self.canonical().key()
    }
}
