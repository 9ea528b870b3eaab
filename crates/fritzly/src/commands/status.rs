//! `fritzly status`

use fritzly_core::{Router, RouterStatus};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(router: &Router, global: &GlobalOpts) -> Result<(), CliError> {
    let bar = util::attach_progress(router, global);
    let result = router.status().await;
    util::finish_progress(router, &bar);
    let status = result?;

    let color = output::should_color(&global.color);
    let rendered = output::render_single(
        &global.output,
        &status,
        |s| detail(s, color),
        |s| s.device.product.clone(),
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn mbit(bps: u64) -> String {
    format!("{:.1} Mbit/s", f64::from(u32::try_from(bps / 1000).unwrap_or(u32::MAX)) / 1000.0)
}

fn detail(status: &RouterStatus, color: bool) -> String {
    let line = |k: &str, v: &str| output::detail_line(k, v, color);
    let uptime = humanize_secs(status.device.uptime_secs);

    [
        output::heading("Device", color),
        line("Product", &status.device.product),
        line("Firmware", &status.device.firmware),
        line("Uptime", &uptime),
        String::new(),
        output::heading("DSL", color),
        line("Link", &status.dsl.link),
        line("Downstream", &mbit(status.dsl.downstream_bps)),
        line("Upstream", &mbit(status.dsl.upstream_bps)),
        String::new(),
        output::heading("Internet", color),
        line("State", &status.wan.state),
        line(
            "IPv4",
            &status
                .wan
                .external_ipv4
                .map_or_else(|| "-".to_owned(), |ip| ip.to_string()),
        ),
        String::new(),
        output::heading("WLAN", color),
        line("Enabled", if status.wlan.enabled { "yes" } else { "no" }),
        line("SSID", &status.wlan.ssid),
        line("Channel", &status.wlan.channel.to_string()),
    ]
    .join("\n")
}

fn humanize_secs(secs: u64) -> String {
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3600, rem % 3600);
    let minutes = rem / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else {
        format!("{hours}h {minutes}m")
    }
}
