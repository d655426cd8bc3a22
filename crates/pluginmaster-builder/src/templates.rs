// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Download link templates.

/// Placeholder replaced with the branch name.
pub const BRANCH_PLACEHOLDER: &str = "{branch}";

/// Placeholder replaced with the plugin's internal name.
pub const PLUGIN_NAME_PLACEHOLDER: &str = "{plugin_name}";

/// Fill in a download link template.
pub fn render_template(template: &str, branch: &str, plugin_name: &str) -> String {
    template
        .replace(BRANCH_PLACEHOLDER, branch)
        .replace(PLUGIN_NAME_PLACEHOLDER, plugin_name)
}

/// Branch name from a CI ref such as `refs/heads/main`.
///
/// Anything after the last `refs/heads/` is the branch; a ref without that
/// prefix is used as is, and no ref at all means `main`.
pub fn branch_from_ref(git_ref: Option<&str>) -> String {
    match git_ref.map(str::trim) {
        Some(r) if !r.is_empty() => r.rsplit("refs/heads/").next().unwrap_or(r).to_string(),
        _ => "main".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_placeholders() {
        let url = render_template(
            "https://github.com/WigglyMuffin/DalamudPlugins/raw/{branch}/plugins/{plugin_name}/latest.zip",
            "main",
            "Questionable",
        );
        assert_eq!(
            url,
            "https://github.com/WigglyMuffin/DalamudPlugins/raw/main/plugins/Questionable/latest.zip"
        );
    }

    #[test]
    fn branch_from_heads_ref() {
        assert_eq!(branch_from_ref(Some("refs/heads/testing")), "testing");
        assert_eq!(branch_from_ref(Some("refs/heads/feature/x")), "feature/x");
    }

    #[test]
    fn branch_defaults_to_main() {
        assert_eq!(branch_from_ref(None), "main");
        assert_eq!(branch_from_ref(Some("  ")), "main");
    }

    #[test]
    fn non_branch_ref_is_kept() {
        assert_eq!(branch_from_ref(Some("refs/tags/v1.0")), "refs/tags/v1.0");
    }
}
