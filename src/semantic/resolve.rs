//! Identifier resolution against a model schema.
//!
//! Each identifier of the logical SQL resolves, in order, to a declared
//! field (metric first, by business then technical name), an internal
//! column, the synthesized default metric, or a SELECT alias. Anything
//! else is [`Resolved::Unknown`] and passes through verbatim.

use crate::model::{internal_column, ElementKind, ModelSchema, SchemaElement};

/// What an identifier denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Dimension(&'a SchemaElement),
    Metric(&'a SchemaElement),
    Internal(&'static str),
    DefaultMetric,
    Alias,
    Unknown,
}

/// Outcome of resolving one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub target: Resolved<'a>,

    /// The name is the business name of one field and the technical name
    /// of another; the business-name match was taken.
    pub ambiguous: bool,
}

impl<'a> Resolution<'a> {
    fn exact(target: Resolved<'a>) -> Self {
        Self {
            target,
            ambiguous: false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.target, Resolved::Unknown)
    }
}

/// Resolves identifiers for one request.
#[derive(Debug, Clone)]
pub struct SchemaResolver<'a> {
    schema: &'a ModelSchema,
    default_metric: Option<&'a str>,
    aliases: Vec<String>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(schema: &'a ModelSchema) -> Self {
        Self {
            schema,
            default_metric: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_default_metric(mut self, name: Option<&'a str>) -> Self {
        self.default_metric = name;
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aliases = aliases
            .into_iter()
            .map(|a| a.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn resolve(&self, name: &str) -> Resolution<'a> {
        let by_name = self.schema.find_by_name(name);
        let by_technical = self.schema.find_by_technical_name(name);

        let ambiguous = match (by_name, by_technical) {
            (Some((_, a)), Some((_, b))) => !std::ptr::eq(a, b),
            _ => false,
        };

        if let Some((kind, element)) = by_name.or(by_technical) {
            let target = match kind {
                ElementKind::Metric => Resolved::Metric(element),
                ElementKind::Dimension => Resolved::Dimension(element),
            };
            return Resolution { target, ambiguous };
        }

        if let Some(col) = internal_column(name) {
            return Resolution::exact(Resolved::Internal(col));
        }
        if self
            .default_metric
            .is_some_and(|m| m.eq_ignore_ascii_case(name))
        {
            return Resolution::exact(Resolved::DefaultMetric);
        }
        if self.aliases.contains(&name.to_lowercase()) {
            return Resolution::exact(Resolved::Alias);
        }
        Resolution::exact(Resolved::Unknown)
    }
}
