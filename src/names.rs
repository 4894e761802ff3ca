//! Name Translation
//!
//! Bidirectional conversion between wire spelling (camelCase) and identifier
//! spelling (snake_case), plus the capitalization rules used when synthesizing
//! names for anonymous nested types.
//!
//! Both directions are pure. The forward direction is memoized because the
//! runtime engine recomputes wire keys on every field access. The two
//! directions do not invert each other for every input (acronym plurals,
//! leading acronyms); per-type wire-key overrides take precedence wherever
//! exactness matters.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// Plural-acronym spellings the generic uppercase-run rule would mangle.
/// Applied before the generic rule when converting to snake_case.
static PLURAL_ACRONYMS: &[(&str, &str)] = &[
    ("URLs", "_urls"),
    ("CIDRs", "_cidrs"),
    ("WWNs", "_wwns"),
];

static SNAKE_TO_CAMEL_CACHE: Lazy<Mutex<HashMap<String, String>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Convert an identifier-cased name to its wire (camelCase) spelling.
///
/// `"secret_name"` becomes `"secretName"`. A trailing keyword-escape
/// underscore is dropped first, so `"type_"` maps to `"type"`.
pub fn snake_to_camel(name: &str) -> String {
    // The cache holds only finished entries, so a lock poisoned by a
    // panicking thread is still safe to reuse
    if let Some(hit) = SNAKE_TO_CAMEL_CACHE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(name)
    {
        return hit.clone();
    }

    let trimmed = name.strip_suffix('_').unwrap_or(name);
    let mut result = String::with_capacity(trimmed.len());
    let mut capitalize_next = false;
    for c in trimmed.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    SNAKE_TO_CAMEL_CACHE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(name.to_string(), result.clone());
    result
}

/// Convert a wire (camelCase) name to identifier casing.
///
/// Known plural acronyms are rewritten first, then a separator is inserted
/// before each internal uppercase run and the whole string lowered:
/// `"issuerRef"` -> `"issuer_ref"`, `"isCA"` -> `"is_ca"`,
/// `"podCIDRs"` -> `"pod_cidrs"`. Results that collide with a reserved
/// identifier get a trailing underscore (`"type"` -> `"type_"`).
pub fn camel_to_snake(name: &str) -> String {
    let mut prepared = name.to_string();
    for (acronym, replacement) in PLURAL_ACRONYMS {
        if prepared.contains(acronym) {
            prepared = prepared.replace(acronym, replacement);
        }
    }

    let mut result = String::with_capacity(prepared.len() + 4);
    let mut prev_breaks = false;
    for c in prepared.chars() {
        if c.is_ascii_uppercase() {
            if prev_breaks {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_breaks = false;
        } else {
            result.push(c);
            prev_breaks = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    if is_reserved_word(&result) {
        result.push('_');
    }
    result
}

/// Synthesize a type name from a property name.
///
/// `"issuerRef"` -> `"IssuerRef"`, `"selector"` -> `"Selector"`. When the
/// anonymous schema describes the items of an array property the plural
/// property name is singularized: `"rules"` -> `"Rule"`,
/// `"policies"` -> `"Policy"`, `"signerURLs"` -> `"SignerURL"`.
pub fn type_name_for_property(property: &str, singularize: bool) -> String {
    let mut base = property.to_string();
    if singularize {
        base = singular(&base);
    }
    let mut chars = base.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    }
}

fn singular(name: &str) -> String {
    // Acronym plurals keep the acronym intact: URLs -> URL
    for (acronym, _) in PLURAL_ACRONYMS {
        if let Some(stem) = name.strip_suffix(acronym) {
            return format!("{}{}", stem, &acronym[..acronym.len() - 1]);
        }
    }
    if let Some(stem) = name.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if name.len() > 1
        && name.ends_with('s')
        && !name.ends_with("ss")
        && !name.ends_with("us")
        && !name.ends_with("is")
    {
        return name[..name.len() - 1].to_string();
    }
    name.to_string()
}

/// Check whether a name is a reserved identifier in the emitted language
pub fn is_reserved_word(s: &str) -> bool {
    matches!(
        s,
        "as" | "async" | "await" | "break" | "const" | "continue" | "crate" | "dyn" |
        "else" | "enum" | "extern" | "false" | "fn" | "for" | "if" | "impl" |
        "in" | "let" | "loop" | "match" | "mod" | "move" | "mut" | "pub" |
        "ref" | "return" | "self" | "static" | "struct" | "super" |
        "trait" | "true" | "type" | "unsafe" | "use" | "where" | "while" |
        // Reserved for future use
        "abstract" | "become" | "box" | "do" | "final" | "macro" | "override" |
        "priv" | "try" | "typeof" | "unsized" | "virtual" | "yield"
    )
}
