//! Providers command - List supported reverse-engineering providers.

use anyhow::Result;
use clap::Args;

use tfgen_iac::{CloudProvider, ProviderDescriptor};

#[derive(Args)]
pub struct ProvidersArgs {
    /// Print the provider table as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: ProvidersArgs) -> Result<()> {
    let providers: Vec<ProviderDescriptor> = CloudProvider::all().iter().map(|p| p.descriptor()).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    println!("☁️  Supported providers:");
    for provider in &providers {
        println!();
        println!("  {} ({})", provider.display_name, provider.id);
        println!("    resources: {}", provider.resource_vocabulary.join(", "));
        println!("    env:       {}", provider.required_env_vars.join(", "));
    }
    Ok(())
}
