//! Item type labels

use crate::value::ItemValue;

/// Human-readable type label for an item, or `""` when it has none.
///
/// Looks at `@type`, then `type`. Multiple types are joined with `,`.
pub fn item_type(item: &ItemValue) -> String {
    if !matches!(item, ItemValue::Mapping(_)) {
        return String::new();
    }

    let found = item
        .get("@type")
        .filter(|v| v.is_truthy())
        .or_else(|| item.get("type"));

    match found {
        Some(ItemValue::Sequence(types)) => types
            .iter()
            .map(ItemValue::render)
            .collect::<Vec<_>>()
            .join(","),
        Some(value) if value.is_truthy() => value.render(),
        _ => String::new(),
    }
}
