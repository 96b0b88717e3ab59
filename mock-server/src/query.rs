//! The subset of the Assets query language the mock understands.
//!
//! A query is a whitespace-separated list of `field:value` terms, all of
//! which must match. Values may be double-quoted to contain spaces and may
//! end in `*` for a prefix match. `*:*` (or an empty query) matches
//! everything. The relation terms `relatedTo`, `relationTarget` and
//! `relationType` are collected separately because they match against the
//! relation table rather than an asset's metadata.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelationFilter {
    pub related_to: String,
    /// `CHILD`, `PARENT` or empty for either direction (case-insensitive).
    pub target: String,
    pub relation_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub terms: Vec<(String, String)>,
    pub relation: Option<RelationFilter>,
}

impl Query {
    pub fn parse(q: &str) -> Self {
        let mut query = Query::default();
        let mut relation = RelationFilter::default();
        for token in tokenize(q) {
            let Some((field, value)) = token.split_once(':') else {
                continue;
            };
            let value = value.trim_matches('"').to_string();
            match field {
                "*" => {}
                "relatedTo" => relation.related_to = value,
                "relationTarget" => relation.target = value,
                "relationType" => relation.relation_type = value,
                _ => query.terms.push((field.to_string(), value)),
            }
        }
        if !relation.related_to.is_empty() {
            query.relation = Some(relation);
        }
        query
    }
}

/// Whether `actual` satisfies a query value, honouring a trailing `*`.
pub fn value_matches(pattern: &str, actual: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => actual.starts_with(prefix),
        None => actual == pattern,
    }
}

fn tokenize(q: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in q.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
