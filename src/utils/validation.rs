use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap());
static QUALIFIED_IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}(?:\.[A-Za-z_][A-Za-z0-9_]{0,62})?$").unwrap()
});

/// Checks a bare column name before it gets spliced into SQL
#[inline(always)]
pub fn is_valid_identifier(ident: &str) -> bool {
    IDENTIFIER_RE.is_match(ident)
}

/// Same as [`is_valid_identifier`], but allows one `schema.` or `table.` prefix
#[inline(always)]
pub fn is_valid_qualified_identifier(ident: &str) -> bool {
    QUALIFIED_IDENTIFIER_RE.is_match(ident)
}
