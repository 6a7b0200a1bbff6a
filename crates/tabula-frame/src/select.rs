//! Column selection.
//!
//! A selection call is a list of [`Selector`] terms. Terms are either all positive (literal
//! names and name predicates, unioned) or all negative (names removed from the full list);
//! mixing the two in one call is rejected because inclusion/exclusion precedence would be
//! ambiguous. Resolved names always come back in the table's column order.

use crate::error::{FrameError, FrameResult, StructuralWarning};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::ops::Neg;
use std::sync::Arc;

/// Name predicate matched against every column name of the table.
#[derive(Clone)]
pub enum NamePredicate {
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Matches(Regex),
    /// Any of the listed names; names missing from the table are ignored.
    OneOf(Vec<String>),
    /// Every column from `from` to `to` inclusive, by position.
    Range { from: String, to: String },
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl fmt::Debug for NamePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePredicate::StartsWith(p) => write!(f, "StartsWith({p:?})"),
            NamePredicate::EndsWith(p) => write!(f, "EndsWith({p:?})"),
            NamePredicate::Contains(p) => write!(f, "Contains({p:?})"),
            NamePredicate::Matches(re) => write!(f, "Matches({:?})", re.as_str()),
            NamePredicate::OneOf(names) => write!(f, "OneOf({names:?})"),
            NamePredicate::Range { from, to } => write!(f, "Range({from:?}..={to:?})"),
            NamePredicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Columns removed by a negative term.
#[derive(Clone, Debug)]
pub enum NameSet {
    Names(Vec<String>),
    Matching(NamePredicate),
}

#[derive(Clone, Debug)]
pub enum Selector {
    ByName(String),
    Predicate(NamePredicate),
    Negate(NameSet),
}

impl Selector {
    pub fn name(name: impl Into<String>) -> Self {
        Selector::ByName(name.into())
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Selector::Predicate(NamePredicate::StartsWith(prefix.into()))
    }

    pub fn ends_with(suffix: impl Into<String>) -> Self {
        Selector::Predicate(NamePredicate::EndsWith(suffix.into()))
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        Selector::Predicate(NamePredicate::Contains(needle.into()))
    }

    pub fn matches(pattern: &str) -> FrameResult<Self> {
        Ok(Selector::Predicate(NamePredicate::Matches(Regex::new(
            pattern,
        )?)))
    }

    pub fn one_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::Predicate(NamePredicate::OneOf(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn range(from: impl Into<String>, to: impl Into<String>) -> Self {
        Selector::Predicate(NamePredicate::Range {
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Selector::Predicate(NamePredicate::Custom(Arc::new(f)))
    }

    /// Negative selection of the given names.
    pub fn except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::Negate(NameSet::Names(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Selector::Negate(_))
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::name(name)
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::ByName(name)
    }
}

/// `-Selector::name("x")` reads as "everything but x". Negating a negative term makes it positive
/// again.
impl Neg for Selector {
    type Output = Selector;

    fn neg(self) -> Selector {
        match self {
            Selector::ByName(name) => Selector::Negate(NameSet::Names(vec![name])),
            Selector::Predicate(predicate) => Selector::Negate(NameSet::Matching(predicate)),
            Selector::Negate(NameSet::Matching(predicate)) => Selector::Predicate(predicate),
            Selector::Negate(NameSet::Names(mut names)) if names.len() == 1 => {
                Selector::ByName(names.remove(0))
            }
            Selector::Negate(NameSet::Names(names)) => {
                Selector::Predicate(NamePredicate::OneOf(names))
            }
        }
    }
}

/// Outcome of resolving a selection against a name list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub names: Vec<String>,
    pub warnings: Vec<StructuralWarning>,
}

/// Resolve `terms` against the live column names.
pub fn resolve<S: AsRef<str>>(names: &[S], terms: &[Selector]) -> FrameResult<Resolution> {
    let names: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();

    if terms.is_empty() {
        return Ok(empty_resolution());
    }

    let negative = terms.iter().filter(|t| t.is_negative()).count();
    if negative != 0 && negative != terms.len() {
        return Err(FrameError::SelectionConflict(format!(
            "cannot combine {} positive and {negative} negative selector terms in one selection",
            terms.len() - negative
        )));
    }

    let known: HashSet<&str> = names.iter().copied().collect();
    let mut literals: HashSet<&str> = HashSet::new();
    let check_literal = |name: &str| -> FrameResult<()> {
        if !known.contains(name) {
            return Err(FrameError::unknown_column(name));
        }
        Ok(())
    };

    if negative > 0 {
        let mut dropped: HashSet<&str> = HashSet::new();
        for term in terms {
            match term {
                Selector::Negate(NameSet::Names(excluded)) => {
                    for name in excluded {
                        check_literal(name)?;
                        if !literals.insert(name.as_str()) {
                            return Err(FrameError::SelectionConflict(format!(
                                "column {name} is dropped more than once"
                            )));
                        }
                        dropped.insert(name.as_str());
                    }
                }
                Selector::Negate(NameSet::Matching(predicate)) => {
                    dropped.extend(matching(&names, predicate)?);
                }
                Selector::ByName(_) | Selector::Predicate(_) => {}
            }
        }
        let kept: Vec<String> = names
            .iter()
            .filter(|n| !dropped.contains(*n))
            .map(|n| n.to_string())
            .collect();
        return Ok(finish(kept));
    }

    let mut selected: HashSet<&str> = HashSet::new();
    for term in terms {
        match term {
            Selector::ByName(name) => {
                check_literal(name)?;
                if !literals.insert(name.as_str()) {
                    return Err(FrameError::SelectionConflict(format!(
                        "column {name} is selected more than once"
                    )));
                }
                selected.insert(name.as_str());
            }
            Selector::Predicate(predicate) => {
                for name in matching(&names, predicate)? {
                    selected.insert(name);
                }
            }
            // Mixed signs were rejected above.
            Selector::Negate(_) => {}
        }
    }

    let ordered: Vec<String> = names
        .iter()
        .filter(|n| selected.contains(*n))
        .map(|n| n.to_string())
        .collect();
    Ok(finish(ordered))
}

fn matching<'n>(names: &[&'n str], predicate: &NamePredicate) -> FrameResult<Vec<&'n str>> {
    let keep = |test: &dyn Fn(&str) -> bool| -> Vec<&'n str> {
        names.iter().copied().filter(|n| test(*n)).collect()
    };
    let hits = match predicate {
        NamePredicate::StartsWith(p) => keep(&|n| n.starts_with(p.as_str())),
        NamePredicate::EndsWith(p) => keep(&|n| n.ends_with(p.as_str())),
        NamePredicate::Contains(p) => keep(&|n| n.contains(p.as_str())),
        NamePredicate::Matches(re) => keep(&|n| re.is_match(n)),
        NamePredicate::OneOf(wanted) => keep(&|n| wanted.iter().any(|w| w == n)),
        NamePredicate::Custom(f) => keep(&|n| f(n)),
        NamePredicate::Range { from, to } => {
            let position = |target: &str| {
                names
                    .iter()
                    .position(|n| *n == target)
                    .ok_or_else(|| FrameError::unknown_column(target))
            };
            let (start, end) = (position(from)?, position(to)?);
            let (start, end) = (start.min(end), start.max(end));
            names[start..=end].to_vec()
        }
    };
    Ok(hits)
}

fn finish(names: Vec<String>) -> Resolution {
    if names.is_empty() {
        return empty_resolution();
    }
    Resolution {
        names,
        warnings: Vec::new(),
    }
}

fn empty_resolution() -> Resolution {
    let warning = StructuralWarning::EmptySelection;
    log::warn!("{warning}");
    Resolution {
        names: Vec::new(),
        warnings: vec![warning],
    }
}
