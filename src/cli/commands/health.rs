//! Service health and metrics commands.

use tokio::runtime::Runtime;

use crate::config::Config;

use super::build_service;

/// Probe the catalog and print a health report
pub fn cmd_health(rt: &Runtime, config: &Config, json: bool) -> anyhow::Result<()> {
    let service = build_service(config);

    rt.block_on(async {
        let report = service.health_check().await;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("Catalog Health");
        println!("==============");
        println!("Overall: {}", report.status);
        println!();

        for (name, source) in &report.sources {
            let mark = if source.available { "✓" } else { "✗" };
            println!("  {} {} : {}", mark, name, source.status);
        }

        let metrics = &report.recent_metrics;
        println!();
        println!("Last {} minutes:", metrics.window_minutes);
        println!("  Calls:        {}", metrics.total_calls);
        if metrics.total_calls > 0 {
            println!("  Success rate: {:.1}%", metrics.success_rate);
            println!(
                "  Avg latency:  {:.0}ms",
                metrics.average_duration_secs * 1000.0
            );
        }
        println!("  Cache hits:   {}", metrics.cache_hits);
        println!("  Cache size:   {}", report.cache_size);
        Ok(())
    })
}
