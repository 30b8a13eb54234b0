//! Configuration-related CLI commands.

use anyhow::Result;
use clap::Parser;

use super::{open_gateway, shutdown};
use crate::gateway::capability::ALL_BACKENDS;
use crate::gateway::{eligible_backends, Capability, GatewayConfig, ServiceBundle};

const CAPABILITIES: [Capability; 3] = [
    Capability::TextAsk,
    Capability::ImageExtract,
    Capability::ImageGenerate,
];

/// Shows backend availability.
#[derive(Parser)]
pub struct BackendsCommand {
    /// Prints the effective configuration (secrets redacted) before building.
    #[arg(long)]
    pub show_config: bool,
}

impl BackendsCommand {
    /// Executes the backends command.
    pub fn execute(self) -> Result<()> {
        if self.show_config {
            let config = GatewayConfig::from_env()?;
            println!("{config:#?}");
            let eligible: Vec<String> = eligible_backends(&config)
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("Eligible: {}\n", eligible.join(", "));
        }

        let gateway = open_gateway()?;
        print!("{}", render_bundle(gateway.bundle()));
        shutdown(gateway);
        Ok(())
    }
}

/// Formats availability, the capability table and construction failures.
fn render_bundle(bundle: &ServiceBundle) -> String {
    let mut out = String::new();
    out.push_str(&format!("Primary backend: {}\n\n", bundle.primary_backend()));

    out.push_str(&format!(
        "{:<16} {:<20} {:<10} {}\n",
        "BACKEND", "PROVIDER", "STATUS", "CAPABILITIES"
    ));
    for kind in ALL_BACKENDS {
        let status = if bundle.has(kind) { "ready" } else { "-" };
        let capabilities: Vec<&str> = kind.capabilities().iter().map(|c| c.as_str()).collect();
        out.push_str(&format!(
            "{:<16} {:<20} {:<10} {}\n",
            kind.as_str(),
            kind.display_name(),
            status,
            capabilities.join(", ")
        ));
    }

    out.push('\n');
    for capability in CAPABILITIES {
        let served_by = capability
            .route()
            .iter()
            .find(|kind| bundle.has(**kind))
            .map_or_else(|| "unavailable".to_string(), ToString::to_string);
        out.push_str(&format!("{:<16} -> {served_by}\n", capability.as_str()));
    }

    if !bundle.construction_failures().is_empty() {
        out.push_str("\nConstruction failures:\n");
        for failure in bundle.construction_failures() {
            out.push_str(&format!("  {failure}\n"));
        }
    }
    out
}
