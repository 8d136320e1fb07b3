use crate::{EntityMetadata, Error, IgnoreCase, Part, PartType, Property, Result};
use anyhow::anyhow;

const PREFIXES: &[&str] = &[
    "find", "read", "get", "query", "search", "stream", "count", "exists", "delete", "remove",
];

/// Sort direction of one ORDER BY entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One resolved ORDER BY entry of a derived query.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub property: Property,
    pub direction: Direction,
}

/// Result shape hints parsed from the method name before the `By` separator.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub count: bool,
    pub exists: bool,
    pub delete: bool,
    pub distinct: bool,
    pub limit: Option<u32>,
}

/// Ordered disjunction of conjunctions of [`Part`]s parsed from a repository
/// method name, plus sort and result shape hints.
///
/// Parsing resolves every property eagerly so a broken method name fails at
/// startup, never at first invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PartTree {
    pub subject: Subject,
    /// Outer entries combine with OR, parts inside one entry with AND.
    pub or_parts: Vec<Vec<Part>>,
    pub sort: Vec<Ordering>,
}

impl PartTree {
    pub fn parse(method_name: &str, metadata: &dyn EntityMetadata) -> Result<Self> {
        let Some(prefix) = PREFIXES.iter().find(|p| method_name.starts_with(**p)) else {
            return Err(anyhow!(
                "Method name `{}` does not start with a query prefix ({})",
                method_name,
                PREFIXES.join(", "),
            ));
        };
        let rest = &method_name[prefix.len()..];
        let (subject_text, predicate_text) = match find_keyword(rest, "By") {
            Some(i) => (&rest[..i], &rest[i + 2..]),
            None => (rest, ""),
        };
        let subject = parse_subject(prefix, subject_text)?;
        let (or_parts, sort) = parse_predicate(method_name, predicate_text, metadata)?;
        Ok(Self {
            subject,
            or_parts,
            sort,
        })
    }

    /// All parts in left-to-right traversal order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.or_parts.iter().flatten()
    }

    pub fn is_exists_projection(&self) -> bool {
        self.subject.exists
    }

    pub fn is_count_projection(&self) -> bool {
        self.subject.count
    }

    pub fn is_limiting(&self) -> bool {
        self.subject.limit.is_some()
    }
}

/// Position of `keyword` in `value` where it starts a new camel hump, meaning
/// it is followed by an uppercase letter or the end of the string.
fn find_keyword(value: &str, keyword: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(i) = value[start..].find(keyword) {
        let position = start + i;
        let next = value[position + keyword.len()..].chars().next();
        if next.is_none_or(|c| c.is_uppercase()) {
            return Some(position);
        }
        start = position + keyword.len();
    }
    None
}

/// Split on every camel hump occurrence of `keyword`, keyword not included.
fn split_keyword<'a>(value: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut rest = value;
    while let Some(i) = find_keyword(rest, keyword) {
        result.push(&rest[..i]);
        rest = &rest[i + keyword.len()..];
    }
    result.push(rest);
    result
}

fn parse_subject(prefix: &str, text: &str) -> Result<Subject> {
    let mut subject = Subject {
        count: prefix == "count",
        exists: prefix == "exists",
        delete: prefix == "delete" || prefix == "remove",
        distinct: find_keyword(text, "Distinct").is_some(),
        limit: None,
    };
    for keyword in ["First", "Top"] {
        if let Some(i) = text.find(keyword) {
            let digits: String = text[i + keyword.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            subject.limit = if digits.is_empty() {
                Some(1)
            } else {
                Some(digits.parse().map_err(|_| {
                    anyhow!("Cannot parse limit `{}` of a limiting query", digits)
                })?)
            };
            break;
        }
    }
    Ok(subject)
}

fn parse_predicate(
    method_name: &str,
    text: &str,
    metadata: &dyn EntityMetadata,
) -> Result<(Vec<Vec<Part>>, Vec<Ordering>)> {
    let (predicate, order) = match find_keyword(text, "OrderBy") {
        Some(i) => (&text[..i], &text[i + "OrderBy".len()..]),
        None => (text, ""),
    };
    let (predicate, all_ignore_case) = strip_suffixes(predicate, &["AllIgnoringCase", "AllIgnoreCase"]);
    let mut or_parts = Vec::new();
    if !predicate.is_empty() {
        for or_token in split_keyword(predicate, "Or") {
            let mut and_parts = Vec::new();
            for and_token in split_keyword(or_token, "And") {
                and_parts.push(parse_part(method_name, and_token, all_ignore_case, metadata)?);
            }
            or_parts.push(and_parts);
        }
    }
    let sort = parse_order(method_name, order, metadata)?;
    Ok((or_parts, sort))
}

fn parse_part(
    method_name: &str,
    token: &str,
    all_ignore_case: bool,
    metadata: &dyn EntityMetadata,
) -> Result<Part> {
    if token.is_empty() {
        return Err(anyhow!(
            "Expected a predicate part, method name `{}` has a dangling And/Or",
            method_name,
        ));
    }
    let (token, mut ignore_case) = strip_suffixes(token, &["IgnoringCase", "IgnoreCase"]);
    let (part_type, property_raw) = PartType::from_token(token);
    let (property_raw, tail_ignore_case) = strip_suffixes(property_raw, &["IgnoringCase", "IgnoreCase"]);
    ignore_case = ignore_case || tail_ignore_case;
    let property = resolve_path(metadata, property_raw).ok_or_else(|| {
        Error::msg(property_error(method_name, property_raw, metadata))
    })?;
    Ok(Part {
        property: property.clone(),
        part_type,
        ignore_case: if ignore_case || all_ignore_case {
            IgnoreCase::Always
        } else {
            IgnoreCase::Never
        },
    })
}

fn parse_order(
    method_name: &str,
    mut text: &str,
    metadata: &dyn EntityMetadata,
) -> Result<Vec<Ordering>> {
    let mut result = Vec::new();
    while !text.is_empty() {
        let (raw, direction, rest) = match (find_keyword(text, "Asc"), find_keyword(text, "Desc")) {
            (Some(a), Some(d)) if a < d => (&text[..a], Direction::Asc, &text[a + 3..]),
            (Some(_), Some(d)) => (&text[..d], Direction::Desc, &text[d + 4..]),
            (Some(a), None) => (&text[..a], Direction::Asc, &text[a + 3..]),
            (None, Some(d)) => (&text[..d], Direction::Desc, &text[d + 4..]),
            (None, None) => (text, Direction::Asc, ""),
        };
        if raw.is_empty() {
            return Err(anyhow!(
                "Invalid order clause in method name `{}`",
                method_name,
            ));
        }
        let property = resolve_path(metadata, raw)
            .ok_or_else(|| Error::msg(property_error(method_name, raw, metadata)))?;
        result.push(Ordering {
            property: property.clone(),
            direction,
        });
        text = rest;
    }
    Ok(result)
}

fn strip_suffixes<'a>(value: &'a str, suffixes: &[&str]) -> (&'a str, bool) {
    for suffix in suffixes {
        if let Some(stripped) = value.strip_suffix(suffix) {
            return (stripped, true);
        }
    }
    (value, false)
}

fn property_error(method_name: &str, raw: &str, metadata: &dyn EntityMetadata) -> String {
    format!(
        "No property `{}` found for table `{}` while resolving method `{}`",
        decapitalize(raw),
        metadata.table_ref().full_name(),
        method_name,
    )
}

/// Resolve a camel case fragment into a declared property, trying the whole
/// fragment first and then every dotted split at camel hump boundaries, so
/// `AddressZipCode` can reach either `addressZipCode` or `address.zipCode`.
fn resolve_path<'a>(metadata: &'a dyn EntityMetadata, raw: &str) -> Option<&'a Property> {
    for candidate in path_candidates(raw) {
        if let Some(property) = metadata.resolve_property(&candidate) {
            return Some(property);
        }
    }
    None
}

fn path_candidates(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    let mut result = vec![decapitalize(raw)];
    let boundaries: Vec<usize> = raw
        .char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .collect();
    for i in boundaries.into_iter().rev() {
        for tail in path_candidates(&raw[i..]) {
            result.push(format!("{}.{}", decapitalize(&raw[..i]), tail));
        }
    }
    result
}

fn decapitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TableMetadata, Value};

    fn users() -> TableMetadata {
        TableMetadata::new(
            "users",
            vec![
                Property::new("id", "id", Value::Int64(None)).identifier(),
                Property::new("firstName", "first_name", Value::Varchar(None)),
                Property::new("lastName", "last_name", Value::Varchar(None)),
                Property::new("age", "age", Value::Int32(None)),
                Property::new("active", "active", Value::Boolean(None)),
                Property::new("address.zipCode", "address_zip_code", Value::Varchar(None)),
            ],
        )
    }

    #[test]
    fn single_part() {
        let tree = PartTree::parse("findAllByFirstName", &users()).unwrap();
        let parts: Vec<_> = tree.parts().collect();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].part_type, PartType::SimpleProperty);
        assert_eq!(parts[0].property.column, "first_name");
        assert!(!tree.is_exists_projection());
    }

    #[test]
    fn and_or_grouping() {
        let tree = PartTree::parse("findAllByLastNameAndAgeOrFirstName", &users()).unwrap();
        assert_eq!(tree.or_parts.len(), 2);
        assert_eq!(tree.or_parts[0].len(), 2);
        assert_eq!(tree.or_parts[1].len(), 1);
        assert_eq!(tree.or_parts[0][1].property.path, "age");
    }

    #[test]
    fn operator_suffix_and_order_by() {
        let tree = PartTree::parse("findAllByAgeGreaterThanOrderByLastNameDesc", &users()).unwrap();
        let parts: Vec<_> = tree.parts().collect();
        assert_eq!(parts[0].part_type, PartType::GreaterThan);
        assert_eq!(tree.sort.len(), 1);
        assert_eq!(tree.sort[0].direction, Direction::Desc);
        assert_eq!(tree.sort[0].property.column, "last_name");
    }

    #[test]
    fn multiple_order_entries_default_ascending() {
        let tree = PartTree::parse("findAllByActiveTrueOrderByLastNameAscFirstName", &users()).unwrap();
        assert_eq!(tree.sort.len(), 2);
        assert_eq!(tree.sort[0].direction, Direction::Asc);
        assert_eq!(tree.sort[1].property.path, "firstName");
        assert_eq!(tree.sort[1].direction, Direction::Asc);
    }

    #[test]
    fn subject_flags() {
        let tree = PartTree::parse("existsByFirstName", &users()).unwrap();
        assert!(tree.is_exists_projection());
        let tree = PartTree::parse("countByActiveTrue", &users()).unwrap();
        assert!(tree.is_count_projection());
        let tree = PartTree::parse("findFirst3ByAge", &users()).unwrap();
        assert_eq!(tree.subject.limit, Some(3));
        let tree = PartTree::parse("findTopByAge", &users()).unwrap();
        assert_eq!(tree.subject.limit, Some(1));
        let tree = PartTree::parse("findDistinctByAge", &users()).unwrap();
        assert!(tree.subject.distinct);
    }

    #[test]
    fn empty_predicate_selects_all() {
        let tree = PartTree::parse("findAll", &users()).unwrap();
        assert_eq!(tree.parts().count(), 0);
        let tree = PartTree::parse("findAllByOrderByLastNameDesc", &users()).unwrap();
        assert_eq!(tree.parts().count(), 0);
        assert_eq!(tree.sort.len(), 1);
    }

    #[test]
    fn ignore_case_suffix() {
        let tree = PartTree::parse("findAllByFirstNameIgnoreCase", &users()).unwrap();
        assert_eq!(tree.parts().next().unwrap().ignore_case, IgnoreCase::Always);
        let tree = PartTree::parse("findAllByFirstNameLikeIgnoreCase", &users()).unwrap();
        let part = tree.parts().next().unwrap();
        assert_eq!(part.part_type, PartType::Like);
        assert_eq!(part.ignore_case, IgnoreCase::Always);
        let tree = PartTree::parse("findAllByFirstNameAndLastNameAllIgnoreCase", &users()).unwrap();
        assert!(tree.parts().all(|p| p.ignore_case == IgnoreCase::Always));
    }

    #[test]
    fn nested_property_resolution() {
        let tree = PartTree::parse("findAllByAddressZipCode", &users()).unwrap();
        assert_eq!(tree.parts().next().unwrap().property.column, "address_zip_code");
    }

    #[test]
    fn unresolved_property_fails_eagerly() {
        let error = PartTree::parse("findAllByNickName", &users()).unwrap_err();
        assert!(error.to_string().contains("No property `nickName`"));
        assert!(error.to_string().contains("findAllByNickName"));
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let error = PartTree::parse("fetchAllByAge", &users()).unwrap_err();
        assert!(error.to_string().contains("does not start with a query prefix"));
    }

    #[test]
    fn keywords_inside_property_names_do_not_split() {
        let metadata = TableMetadata::new(
            "work_orders",
            vec![Property::new("workOrder", "work_order", Value::Varchar(None))],
        );
        let tree = PartTree::parse("findAllByWorkOrder", &metadata).unwrap();
        assert_eq!(tree.parts().next().unwrap().property.column, "work_order");
    }
}
