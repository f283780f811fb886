//! `modelurl check`: validate mappings and print what was registered.

use anyhow::Result;

use modelurl::demo::Host;
use modelurl::log;
use modelurl::model::CANONICAL_ACCESSOR;
use modelurl::utils::plural::plural_count;

/// Print the loaded registries. Validation already happened in `Host::build`.
pub fn run_check(host: &Host) -> Result<()> {
    for line in summary(host) {
        println!("{line}");
    }
    log!(
        "check";
        "{}, {} ok",
        plural_count(host.registry.types.len(), "type"),
        plural_count(host.registry.views.len(), "view")
    );
    Ok(())
}

fn summary(host: &Host) -> Vec<String> {
    let types = host.registry.types.entries().into_iter().map(|entry| {
        let accessor = entry.accessor.as_deref().unwrap_or(CANONICAL_ACCESSOR);
        format!("  type {} -> {}", entry.type_ref, accessor)
    });
    let views = host.registry.views.entries().into_iter().map(|entry| {
        let detail = match (&entry.context, entry.disabled) {
            (_, true) => "disabled".to_string(),
            (Some(context), false) if entry.remove_query => format!("{context} (query removed)"),
            (Some(context), false) => context.clone(),
            (None, false) => String::new(),
        };
        format!("  view {} -> {}", entry.view, detail)
    });
    types.chain(views).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_every_mapping() {
        let host = Host::example().unwrap();
        let lines = summary(&host);
        assert_eq!(
            lines,
            vec![
                "  type example.models.Item -> my_url",
                "  type example.models.Page -> canonical_url",
                "  view example.admin.root -> disabled",
                "  view example.views.item_by_barcode -> item",
                "  view example.views.item_by_id -> item",
                "  view example.views.page_by_id -> page",
            ]
        );
    }
}
