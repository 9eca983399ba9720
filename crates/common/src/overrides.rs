//! Override directives and scope resolution
//!
//! Every directive is stored as a flat entry in declaration order. Resolving
//! a directive for a node is a two-key maximum over the entries whose scope
//! accepts the active emitter: scoped entries beat unscoped ones, and within
//! the same tier the later declaration wins.

use crate::flags::{Access, UsageFlags};
use crate::graph::{NamespaceId, OperationId, PropertyId, TypeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node an override is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum OverrideTarget {
    Type(TypeId),
    Property(PropertyId),
    Operation(OperationId),
    Namespace(NamespaceId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Directive {
    Access(Access),
    /// OR-ed into the computed usage
    Usage(UsageFlags),
    ClientName(String),
    /// Model whose properties are elevated to client initialization
    ClientInitialization(TypeId),
    /// Method-level name matched by a client-initialization property
    ParamAlias(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Access,
    Usage,
    ClientName,
    ClientInitialization,
    ParamAlias,
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Access(_) => DirectiveKind::Access,
            Directive::Usage(_) => DirectiveKind::Usage,
            Directive::ClientName(_) => DirectiveKind::ClientName,
            Directive::ClientInitialization(_) => DirectiveKind::ClientInitialization,
            Directive::ParamAlias(_) => DirectiveKind::ParamAlias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid scope {scope:?}: {reason}")]
pub struct InvalidScope {
    pub scope: String,
    pub reason: String,
}

/// Target-emitter filter such as `csharp`, `!java` or `python,!go`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Scope {
    pub fn parse(text: &str) -> Result<Self, InvalidScope> {
        let mut scope = Scope::default();
        for term in text.split(',') {
            let term = term.trim();
            let (negated, name) = match term.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, term),
            };
            if name.is_empty() {
                return Err(InvalidScope {
                    scope: text.to_string(),
                    reason: "empty scope term".to_string(),
                });
            }
            if name.contains(|c: char| c.is_whitespace() || c == '!') {
                return Err(InvalidScope {
                    scope: text.to_string(),
                    reason: format!("malformed scope term '{}'", term),
                });
            }
            let name = name.to_lowercase();
            if negated {
                scope.negative.push(name);
            } else {
                scope.positive.push(name);
            }
        }
        Ok(scope)
    }

    /// Negations exclude their emitter; a purely negated scope admits all others
    pub fn accepts(&self, emitter: Option<&str>) -> bool {
        let Some(emitter) = emitter else {
            return self.positive.is_empty();
        };
        let emitter = emitter.to_lowercase();
        if self.negative.contains(&emitter) {
            return false;
        }
        self.positive.is_empty() || self.positive.contains(&emitter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub target: OverrideTarget,
    pub directive: Directive,
    #[serde(default)]
    pub scope: Option<String>,
}

impl OverrideEntry {
    pub fn new(target: OverrideTarget, directive: Directive) -> Self {
        Self {
            target,
            directive,
            scope: None,
        }
    }

    pub fn scoped(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// `None` for unscoped entries
    pub fn parsed_scope(&self) -> Result<Option<Scope>, InvalidScope> {
        self.scope.as_deref().map(Scope::parse).transpose()
    }
}

/// All override directives of a graph, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideTable {
    entries: Vec<OverrideEntry>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: OverrideEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[OverrideEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose scope string does not parse; they never apply
    pub fn invalid_scopes(&self) -> Vec<(&OverrideEntry, InvalidScope)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.parsed_scope().err().map(|err| (entry, err)))
            .collect()
    }

    /// Winning directive of `kind` on `target` for `emitter`
    pub fn resolve(
        &self,
        target: OverrideTarget,
        kind: DirectiveKind,
        emitter: Option<&str>,
    ) -> Option<&Directive> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.target == target && entry.directive.kind() == kind)
            .filter_map(|(order, entry)| {
                let scope = entry.parsed_scope().ok()?;
                let accepted = scope.as_ref().is_none_or(|s| s.accepts(emitter));
                accepted.then_some(((u8::from(scope.is_some()), order), entry))
            })
            .max_by_key(|(key, _)| *key)
            .map(|(_, entry)| &entry.directive)
    }

    pub fn access(&self, target: OverrideTarget, emitter: Option<&str>) -> Option<Access> {
        match self.resolve(target, DirectiveKind::Access, emitter) {
            Some(Directive::Access(access)) => Some(*access),
            _ => None,
        }
    }

    pub fn usage(&self, target: OverrideTarget, emitter: Option<&str>) -> Option<UsageFlags> {
        match self.resolve(target, DirectiveKind::Usage, emitter) {
            Some(Directive::Usage(usage)) => Some(*usage),
            _ => None,
        }
    }

    pub fn client_name(&self, target: OverrideTarget, emitter: Option<&str>) -> Option<&str> {
        match self.resolve(target, DirectiveKind::ClientName, emitter) {
            Some(Directive::ClientName(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn client_initialization(
        &self,
        namespace: NamespaceId,
        emitter: Option<&str>,
    ) -> Option<TypeId> {
        match self.resolve(
            OverrideTarget::Namespace(namespace),
            DirectiveKind::ClientInitialization,
            emitter,
        ) {
            Some(Directive::ClientInitialization(model)) => Some(*model),
            _ => None,
        }
    }

    pub fn param_alias(&self, property: PropertyId, emitter: Option<&str>) -> Option<&str> {
        match self.resolve(
            OverrideTarget::Property(property),
            DirectiveKind::ParamAlias,
            emitter,
        ) {
            Some(Directive::ParamAlias(alias)) => Some(alias.as_str()),
            _ => None,
        }
    }
}
