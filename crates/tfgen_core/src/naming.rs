//! Stable tool-family names for module references.

use crate::module::ModuleReference;
use crate::normalizer::is_registry_coordinate;

/// Hosts whose URLs are treated as git repositories.
const GIT_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];

/// Used only when nothing usable survives sanitization.
const FALLBACK_NAME: &str = "module";

/// Derive the tool-family name for a module.
///
/// Priority: explicit name, then `provider_resource`, then the URL.
/// The function is total and never returns an empty string.
pub fn derive_name(reference: &ModuleReference) -> String {
    if let Some(name) = reference.name.as_deref().map(|n| sanitize(&n.trim().replace('-', "_"))) {
        if !name.is_empty() {
            return name;
        }
    }

    if let (Some(provider), Some(resource)) = (&reference.provider, &reference.resource_type) {
        let name = sanitize(&format!("{}_{}", provider, resource));
        if name != "_" {
            return name;
        }
    }

    name_from_url(&reference.url)
}

/// Derive a name from a module URL alone.
pub fn name_from_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let url = match url.find("/tree/") {
        Some(idx) => &url[..idx],
        None => url,
    };

    if is_git_hosted(url) {
        let trimmed = url.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        let repo = last_segment(trimmed);

        if let Some(name) = terraform_repo_name(repo).map(|n| sanitize(&n)).filter(|n| !n.is_empty()) {
            return name;
        }
        let name = sanitize(&repo.replace('-', "_"));
        if !name.is_empty() {
            return name;
        }
    } else if url.matches('/').count() == 2 && is_registry_coordinate(url) {
        let mut parts = url.split('/');
        if let (Some(_namespace), Some(name), Some(provider)) = (parts.next(), parts.next(), parts.next()) {
            if !name.is_empty() && !provider.is_empty() {
                return format!("{}_{}", provider, name).to_lowercase();
            }
        }
    }

    let name = sanitize(&last_segment(url.trim_end_matches('/')).replace('-', "_"));
    if !name.is_empty() {
        return name;
    }

    let whole = sanitize(&url.replace(['-', '/', '.', ':'], "_"));
    let whole = whole.trim_matches('_');
    if whole.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        whole.to_string()
    }
}

fn is_git_hosted(url: &str) -> bool {
    let url = url.strip_prefix("git::").unwrap_or(url);
    let remote = ["http://", "https://", "git@", "ssh://"]
        .iter()
        .any(|scheme| url.starts_with(scheme));
    remote && GIT_HOSTS.iter().any(|host| url.contains(host))
}

fn last_segment(url: &str) -> &str {
    url.rsplit(['/', ':']).next().unwrap_or(url)
}

/// `terraform-<provider>-<resource...>` → `provider_resource`.
fn terraform_repo_name(repo: &str) -> Option<String> {
    if !repo.starts_with("terraform-") {
        return None;
    }
    let parts: Vec<&str> = repo.split('-').collect();
    if parts.len() < 3 || parts[1].is_empty() {
        return None;
    }
    Some(format!("{}_{}", parts[1], parts[2..].join("_")).to_lowercase())
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(url: &str) -> ModuleReference {
        ModuleReference::new(url).unwrap()
    }

    #[test]
    fn test_explicit_name() {
        let r = reference("https://github.com/a/b").with_name("My-Network");
        assert_eq!(derive_name(&r), "my_network");
    }

    #[test]
    fn test_explicit_name_sanitized() {
        let r = reference("https://github.com/a/b").with_name("core.network v2");
        assert_eq!(derive_name(&r), "corenetworkv2");
        let r = reference("https://github.com/a/b").with_name("...");
        assert_eq!(derive_name(&r), "b");
    }

    #[test]
    fn test_provider_resource() {
        let r = reference("https://github.com/a/b").with_provider_resource("AWS", "s3_bucket");
        assert_eq!(derive_name(&r), "aws_s3_bucket");
    }

    #[test]
    fn test_github_terraform_repo() {
        let r = reference("https://github.com/terraform-aws-modules/terraform-aws-vpc");
        assert_eq!(derive_name(&r), "aws_vpc");
    }

    #[test]
    fn test_github_multi_part_resource() {
        assert_eq!(
            name_from_url("https://github.com/terraform-aws-modules/terraform-aws-security-group.git"),
            "aws_security_group"
        );
        assert_eq!(
            name_from_url("https://github.com/org/terraform-google-gke/tree/main/modules/private"),
            "google_gke"
        );
        assert_eq!(name_from_url("git@github.com:org/terraform-azurerm-aks.git"), "azurerm_aks");
        assert_eq!(
            name_from_url("git::https://github.com/org/terraform-aws-vpc.git?ref=v1.2.0"),
            "aws_vpc"
        );
        assert_eq!(name_from_url("https://github.com/org/network.core#readme"), "networkcore");
    }

    #[test]
    fn test_github_plain_repo() {
        assert_eq!(name_from_url("https://gitlab.com/acme/Network-Core/"), "network_core");
        assert_eq!(name_from_url("https://github.com/acme/terraform-x"), "terraform_x");
    }

    #[test]
    fn test_registry_coordinate() {
        assert_eq!(name_from_url("terraform-aws-modules/vpc/aws"), "aws_vpc");
    }

    #[test]
    fn test_fallback_sanitizes() {
        assert_eq!(name_from_url("https://example.com/modules/My-Module.v2"), "my_modulev2");
        assert_eq!(name_from_url("./modules/db-cluster"), "db_cluster");
    }

    #[test]
    fn test_never_empty() {
        assert_eq!(name_from_url("https://example.com/"), "examplecom");
        assert_eq!(name_from_url("///"), FALLBACK_NAME);
        assert!(!name_from_url("!!!").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let r = reference("https://github.com/terraform-aws-modules/terraform-aws-eks");
        assert_eq!(derive_name(&r), derive_name(&r));
    }
}
