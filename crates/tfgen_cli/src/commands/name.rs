//! Name command - Derive tool-family names for module URLs.

use anyhow::Result;
use clap::Args;

use tfgen_core::{derive_name, ModuleReference};

use super::UsageError;

#[derive(Args)]
pub struct NameArgs {
    /// Module URLs or registry coordinates
    #[arg(required = true)]
    urls: Vec<String>,

    /// Explicit module name
    #[arg(long)]
    name: Option<String>,

    /// Provider, used together with --resource-type
    #[arg(long, requires = "resource_type")]
    provider: Option<String>,

    /// Resource type, used together with --provider
    #[arg(long, requires = "provider")]
    resource_type: Option<String>,
}

pub fn execute(args: NameArgs) -> Result<()> {
    for name in derive_names(&args)? {
        println!("{}", name);
    }
    Ok(())
}

fn derive_names(args: &NameArgs) -> Result<Vec<String>, UsageError> {
    args.urls
        .iter()
        .map(|url| {
            let mut reference =
                ModuleReference::new(url).ok_or_else(|| UsageError("empty module URL".into()))?;
            if let Some(name) = &args.name {
                reference = reference.with_name(name);
            }
            if let (Some(provider), Some(resource_type)) = (&args.provider, &args.resource_type) {
                reference = reference.with_provider_resource(provider, resource_type);
            }
            Ok(derive_name(&reference))
        })
        .collect()
}
