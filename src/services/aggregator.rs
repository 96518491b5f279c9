use crate::models::{BestYield, PoolRecord};

/// Shown when there is no matching pool. Distinct from a real 0% APY.
pub const DEFAULT_DISPLAY_APY: &str = "~3%";

/// Derives the recommended yield for `target_symbol` from a pool set.
/// Pure: the same input always produces the same output.
pub fn aggregate(pools: &[PoolRecord], target_symbol: &str) -> BestYield {
    let needle = target_symbol.to_uppercase();
    let mut matched: Vec<PoolRecord> = pools
        .iter()
        .filter(|p| symbol_matches(&p.symbol, &needle))
        .cloned()
        .collect();

    if matched.is_empty() {
        return BestYield {
            best_apy: None,
            best_source: None,
            total_tvl_usd: None,
            display_apy: DEFAULT_DISPLAY_APY.to_string(),
            ranked_pools: Vec::new(),
        };
    }

    let total_tvl: f64 = matched.iter().map(|p| p.tvl_usd).sum();

    // sort_by is stable: equal APYs keep fetch order
    matched.sort_by(|a, b| b.apy.total_cmp(&a.apy));
    let best = &matched[0];

    BestYield {
        best_apy: Some(best.apy),
        best_source: Some(project_label(&best.project)),
        total_tvl_usd: Some(total_tvl),
        display_apy: format!("~{:.1}%", best.apy),
        ranked_pools: matched,
    }
}

/// Case-insensitive substring match. The `USD COIN` alias catches
/// pools labeled by name rather than ticker.
fn symbol_matches(symbol: &str, needle_upper: &str) -> bool {
    let upper = symbol.to_uppercase();
    upper.contains(needle_upper) || (needle_upper == "USDC" && upper.contains("USD COIN"))
}

/// `superlend-v2` -> `Superlend V2`
pub fn project_label(project: &str) -> String {
    project
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
