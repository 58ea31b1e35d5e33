//! Utility-class merging.
//!
//! Joins class fragments the way `clsx` does, then drops earlier classes
//! that a later one overrides (`px-4 px-8` → `px-8`). Only a common subset
//! of utility groups is recognised; anything else is kept as written, minus
//! exact duplicates.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

const COLORS: &str = "slate|gray|zinc|neutral|stone|red|orange|amber|yellow|lime|green|emerald\
                      |teal|cyan|sky|blue|indigo|violet|purple|fuchsia|pink|rose";

const DISPLAY: &[&str] = &[
    "block",
    "inline-block",
    "inline",
    "flex",
    "inline-flex",
    "grid",
    "inline-grid",
    "table",
    "contents",
    "hidden",
];

const POSITION: &[&str] = &["static", "fixed", "absolute", "relative", "sticky"];

struct Rules {
    color: Regex,
    text_size: Regex,
    font_weight: Regex,
    rounded: Regex,
    shadow: Regex,
    scalar: Regex,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        let color = format!(
            r"^(bg|text|border|ring|outline|fill|stroke|from|via|to)-((?:{COLORS})-\d{{2,3}}|black|white|transparent|current|inherit)$"
        );
        Rules {
            color: Regex::new(&color).expect("valid color pattern"),
            text_size: Regex::new(r"^text-(xs|sm|base|lg|xl|[2-9]xl)$").expect("valid pattern"),
            font_weight: Regex::new(
                r"^font-(thin|extralight|light|normal|medium|semibold|bold|extrabold|black)$",
            )
            .expect("valid pattern"),
            rounded: Regex::new(r"^rounded(-(none|sm|md|lg|xl|2xl|3xl|full))?$")
                .expect("valid pattern"),
            shadow: Regex::new(r"^shadow(-(none|sm|md|lg|xl|2xl|inner))?$").expect("valid pattern"),
            scalar: Regex::new(
                r"^-?(px|py|pt|pr|pb|pl|ps|pe|p|mx|my|mt|mr|mb|ml|ms|me|m|min-w|min-h|max-w|max-h|w|h|size|gap-x|gap-y|gap|space-x|space-y|inset-x|inset-y|inset|top|right|bottom|left|z|opacity|leading|tracking|order|basis|grow|shrink)-.+$",
            )
            .expect("valid pattern"),
        }
    })
}

/// Conflict group of a bare utility (variants already stripped).
fn group_of(utility: &str) -> Option<String> {
    if DISPLAY.contains(&utility) {
        return Some("display".to_string());
    }
    if POSITION.contains(&utility) {
        return Some("position".to_string());
    }
    let rules = rules();
    if let Some(caps) = rules.color.captures(utility) {
        return Some(format!("{}-color", &caps[1]));
    }
    if rules.text_size.is_match(utility) {
        return Some("text-size".to_string());
    }
    if rules.font_weight.is_match(utility) {
        return Some("font-weight".to_string());
    }
    if rules.rounded.is_match(utility) {
        return Some("rounded".to_string());
    }
    if rules.shadow.is_match(utility) {
        return Some("shadow".to_string());
    }
    rules.scalar.captures(utility).map(|caps| caps[1].to_string())
}

/// Merge class fragments. `None` and empty fragments are skipped.
///
/// ```
/// use verstore::util::class_names;
///
/// let active = true;
/// let merged = class_names([
///     Some("px-4 py-2"),
///     Some("bg-blue-500"),
///     active.then_some("bg-red-500"),
/// ]);
/// assert_eq!(merged, "px-4 py-2 bg-red-500");
/// ```
pub fn class_names<'a, I>(inputs: I) -> String
where
    I: IntoIterator,
    I::Item: Into<Option<&'a str>>,
{
    let mut kept: Vec<Option<&'a str>> = Vec::new();
    let mut by_group: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<&'a str> = HashSet::new();

    for class in inputs
        .into_iter()
        .filter_map(|item| -> Option<&'a str> { item.into() })
        .flat_map(str::split_whitespace)
    {
        let (variants, utility) = match class.rsplit_once(':') {
            Some((v, u)) => (v, u),
            None => ("", class),
        };
        let utility = utility.strip_prefix('!').unwrap_or(utility);

        match group_of(utility) {
            Some(group) => {
                let scoped = format!("{variants}|{group}");
                if let Some(prev) = by_group.insert(scoped, kept.len()) {
                    kept[prev] = None;
                }
                kept.push(Some(class));
            }
            None => {
                if seen.insert(class) {
                    kept.push(Some(class));
                }
            }
        }
    }

    kept.into_iter().flatten().collect::<Vec<_>>().join(" ")
}
