// ─── Loader Script ───
// The shim the host's entry point is redirected to. With the launch flag it
// imports the runtime; otherwise it boots the host's own launcher and puts
// back the entry the host would have picked for its build number.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::paths::InstallLayout;

/// Command-line flag that makes the loader start the runtime.
pub const LAUNCH_FLAG: &str = "--no-sandbox";

/// One step of the host's build-number -> entry-point rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRule {
    pub min_build: u64,
    pub entry: String,
}

/// Copy of the host's internal dispatch rule. It has to track new host
/// releases; `revision` names the host build the table was last checked
/// against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderDispatch {
    pub revision: String,
    pub rules: Vec<DispatchRule>,
    pub fallback: String,
}

impl Default for LoaderDispatch {
    fn default() -> Self {
        Self {
            revision: "qq-29271".into(),
            rules: vec![
                DispatchRule {
                    min_build: 29271,
                    entry: "./application.asar/app_launcher/index.js".into(),
                },
                DispatchRule {
                    min_build: 28060,
                    entry: "./application/app_launcher/index.js".into(),
                },
            ],
            fallback: "./app_launcher/index.js".into(),
        }
    }
}

impl LoaderDispatch {
    /// Rules with the highest threshold first.
    pub fn ordered_rules(&self) -> Vec<&DispatchRule> {
        let mut rules: Vec<&DispatchRule> = self.rules.iter().collect();
        rules.sort_by(|a, b| b.min_build.cmp(&a.min_build));
        rules
    }

    /// Entry point the host would choose for `build`.
    pub fn entry_for(&self, build: u64) -> &str {
        self.ordered_rules()
            .into_iter()
            .find(|rule| build >= rule.min_build)
            .map(|rule| rule.entry.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// Every entry point the host itself can be configured with.
    pub fn known_entries(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .map(|r| r.entry.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
            .filter(|entry| seen.insert(*entry))
            .map(str::to_string)
            .collect()
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

pub fn render_loader_script(layout: &InstallLayout, dispatch: &LoaderDispatch) -> String {
    let host_manifest = layout.host_manifest();
    let host_launcher = layout.host_launcher();
    let runtime_module = format!("file://{}", layout.runtime_entry_module().to_string_lossy());

    let mut table = String::new();
    for rule in dispatch.ordered_rules() {
        table.push_str(&format!(
            "                if (build >= {}) return {};\n",
            rule.min_build,
            js_string(&rule.entry)
        ));
    }

    format!(
        r#"// Generated by NapCatInstaller (dispatch table {revision}).
const injectNapCat = process.argv.includes({flag});
const hostPackage = require({host_manifest});

if (injectNapCat) {{
    (async () => {{
        await import({runtime_module});
    }})();
}} else {{
    require({host_launcher});
    setImmediate(() => {{
        global.launcher.installPathPkgJson.main = ((build) => {{
{table}                return {fallback};
            }})(hostPackage.buildVersion);
    }});
}}
"#,
        revision = dispatch.revision,
        flag = js_string(LAUNCH_FLAG),
        host_manifest = js_string(&host_manifest.to_string_lossy()),
        runtime_module = js_string(&runtime_module),
        host_launcher = js_string(&host_launcher.to_string_lossy()),
        table = table,
        fallback = js_string(&dispatch.fallback),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::HOST_APP_DIR;

    #[test]
    fn known_entries_drop_non_adjacent_duplicates() {
        let dispatch = LoaderDispatch {
            revision: "custom".into(),
            rules: vec![
                DispatchRule {
                    min_build: 30000,
                    entry: "./a/index.js".into(),
                },
                DispatchRule {
                    min_build: 29000,
                    entry: "./b/index.js".into(),
                },
                DispatchRule {
                    min_build: 28000,
                    entry: "./a/index.js".into(),
                },
            ],
            fallback: "./b/index.js".into(),
        };
        assert_eq!(dispatch.known_entries(), ["./a/index.js", "./b/index.js"]);
    }

    #[test]
    fn dispatch_matches_host_thresholds() {
        let dispatch = LoaderDispatch::default();
        assert_eq!(
            dispatch.entry_for(29271),
            "./application.asar/app_launcher/index.js"
        );
        assert_eq!(
            dispatch.entry_for(29270),
            "./application/app_launcher/index.js"
        );
        assert_eq!(dispatch.entry_for(28060), "./application/app_launcher/index.js");
        assert_eq!(dispatch.entry_for(28059), "./app_launcher/index.js");
    }

    #[test]
    fn unordered_rules_still_pick_highest_threshold() {
        let mut dispatch = LoaderDispatch::default();
        dispatch.rules.reverse();
        assert_eq!(
            dispatch.entry_for(30000),
            "./application.asar/app_launcher/index.js"
        );
    }

    #[test]
    fn script_embeds_absolute_paths_and_table() {
        let layout = InstallLayout::new(
            HOST_APP_DIR,
            "/Users/alice/Library/Containers/com.tencent.qq/Data",
            "/tmp/NapCatInstaller",
        );
        let script = render_loader_script(&layout, &LoaderDispatch::default());

        assert!(script.contains(r#"process.argv.includes("--no-sandbox")"#));
        assert!(script.contains(
            r#"import("file:///Users/alice/Library/Containers/com.tencent.qq/Data/Documents/napcat/napcat.mjs")"#
        ));
        assert!(script.contains(
            r#"require("/Applications/QQ.app/Contents/Resources/app/app_launcher/index.js")"#
        ));
        assert!(script.contains(
            r#"require("/Applications/QQ.app/Contents/Resources/app/package.json")"#
        ));

        let high = script.find("build >= 29271").unwrap();
        let low = script.find("build >= 28060").unwrap();
        assert!(high < low);
        assert!(script.contains(r#"return "./app_launcher/index.js";"#));
    }
}
