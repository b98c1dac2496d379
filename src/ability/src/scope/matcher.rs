/// Scope matching and helpers
///
/// Free functions over any [`ScopeSource`]: stringification with
/// placeholder substitution, hierarchy tests, prefix regex construction and
/// id lookups.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::types::{Scope, ScopeError, ScopeResult, ScopeSource, SCOPE_DELIMITER, SCOPE_WILDCARD};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"));

/// Parse any supported scope encoding into its canonical form
pub fn parse_scope<S: ScopeSource + ?Sized>(scope: &S) -> ScopeResult<Scope> {
    scope.to_scope()
}

/// Render a scope as `type:id:type:id...`
pub fn stringify_scope<S: ScopeSource + ?Sized>(scope: &S) -> ScopeResult<String> {
    Ok(scope.to_scope()?.to_string())
}

/// Render a scope and substitute `{placeholder}` values
///
/// Text input is substituted as written; other encodings are rendered
/// first. Placeholder names are looked up case-insensitively. Substitution
/// is a single pass; unresolved placeholders are left verbatim.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use cretoai_ability::scope::stringify_scope_with;
///
/// let vars = HashMap::from([("orgId".to_string(), "42".to_string())]);
/// let rendered = stringify_scope_with("org:{orgid}:app:{appId}", &vars).unwrap();
/// assert_eq!(rendered, "org:42:app:{appId}");
/// ```
pub fn stringify_scope_with<S: ScopeSource + ?Sized>(
    scope: &S,
    variables: &HashMap<String, String>,
) -> ScopeResult<String> {
    let rendered = match scope.raw_text() {
        Some(text) => text.to_string(),
        None => stringify_scope(scope)?,
    };
    if variables.is_empty() {
        return Ok(rendered);
    }

    let lookup: HashMap<String, &str> = variables
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.as_str()))
        .collect();

    let substituted = PLACEHOLDER.replace_all(&rendered, |caps: &Captures<'_>| {
        match lookup.get(&caps[1].to_lowercase()) {
            Some(value) => (*value).to_string(),
            None => caps[0].to_string(),
        }
    });

    Ok(substituted.into_owned())
}

/// Concatenate scopes in order, parent segments first
///
/// `None` entries are skipped.
pub fn merge_scopes<I, S>(scopes: I) -> ScopeResult<Scope>
where
    I: IntoIterator<Item = S>,
    S: ScopeSource,
{
    let mut merged = Scope::global();
    for scope in scopes {
        merged = merged.join(&scope.to_scope()?);
    }
    Ok(merged)
}

/// True iff the scope parses to the global (empty) namespace
pub fn is_global_scope<S: ScopeSource + ?Sized>(scope: &S) -> ScopeResult<bool> {
    Ok(scope.to_scope()?.is_global())
}

/// Checks whether `parent` covers `child`
///
/// Not symmetric: `org:123` covers `org:123:app:456` but not the reverse.
pub fn is_parent_scope<P, C>(parent: &P, child: &C) -> ScopeResult<bool>
where
    P: ScopeSource + ?Sized,
    C: ScopeSource + ?Sized,
{
    Ok(parent.to_scope()?.is_parent_of(&child.to_scope()?))
}

/// Build a left-anchored pattern for a scope
///
/// Literal characters are escaped and each `*` matches any run of
/// characters except the segment delimiter. The pattern is anchored at the
/// start only, so it also accepts any scope extending it.
///
/// # Examples
///
/// ```
/// use cretoai_ability::scope::create_scope_regex;
///
/// let regex = create_scope_regex("org:*:app:456").unwrap();
/// assert!(regex.is_match("org:1:app:456"));
/// assert!(regex.is_match("org:1:app:456:role:7"));
/// assert!(!regex.is_match("org:1:app:457"));
/// ```
pub fn create_scope_regex<S: ScopeSource + ?Sized>(scope: &S) -> ScopeResult<Regex> {
    let rendered = stringify_scope(scope)?;
    let any_segment = format!("[^{}]*", regex::escape(&SCOPE_DELIMITER.to_string()));
    let pattern = rendered
        .split(SCOPE_WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(&any_segment);

    Regex::new(&format!("^{}", pattern)).map_err(|e| ScopeError::PatternError(e.to_string()))
}

/// Id of the first subject with the given type
///
/// Returns `None` when the type is absent or has no id.
pub fn get_id_from_scope<S: ScopeSource + ?Sized>(
    scope: &S,
    kind: &str,
) -> ScopeResult<Option<String>> {
    let kind = kind.trim().to_lowercase();
    Ok(scope
        .to_scope()?
        .iter()
        .find(|subject| subject.kind == kind)
        .and_then(|subject| subject.id.clone()))
}

/// Look up the ids of several scope types at once
///
/// Every requested key must be present with an id, otherwise
/// `ScopeError::MissingKey` is returned.
pub fn parse_scope_ids<S: ScopeSource + ?Sized>(
    scope: &S,
    keys: &[&str],
) -> ScopeResult<HashMap<String, String>> {
    let parsed = scope.to_scope()?;
    let mut ids = HashMap::with_capacity(keys.len());

    for key in keys {
        let id = get_id_from_scope(&parsed, key)?.ok_or_else(|| ScopeError::MissingKey {
            key: (*key).to_string(),
            scope: parsed.to_string(),
        })?;
        ids.insert((*key).to_string(), id);
    }

    Ok(ids)
}
