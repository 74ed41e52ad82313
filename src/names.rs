//! Qualified name utilities
//!
//! Splitting `alias:local` names, joining them back, and the deterministic
//! child ordering used by node types that declare an explicit order.

use std::collections::HashMap;

/// Split a qualified tag into its alias and local name.
///
/// The split happens on the first `:`; a name without a colon has no alias.
pub fn split_namespace(tag: &str) -> (Option<&str>, &str) {
    match tag.split_once(':') {
        Some((alias, local)) => (Some(alias), local),
        None => (None, tag),
    }
}

/// Qualify a local name with an alias. Identity when the alias is `None`.
pub fn unsplit_namespace(name: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("{}:{}", alias, name),
        None => name.to_string(),
    }
}

/// Reorder items according to an ordering list.
///
/// Items whose name appears in `order` come first, in the list's order;
/// everything else follows, sorted by name. Items without a name sort as
/// the empty name among the unlisted ones. The sort is stable and the
/// input is left untouched.
pub fn order_items<'a, T, S, F>(items: &'a [T], order: &[S], name_of: F) -> Vec<&'a T>
where
    S: AsRef<str>,
    F: Fn(&T) -> Option<String>,
{
    let positions: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_ref(), idx))
        .collect();

    let mut keyed: Vec<((bool, usize, String), &'a T)> = items
        .iter()
        .map(|item| {
            let name = name_of(item).unwrap_or_default();
            let key = match positions.get(name.as_str()) {
                Some(&pos) => (false, pos, name),
                None => (true, 0, name),
            };
            (key, item)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, item)| item).collect()
}
