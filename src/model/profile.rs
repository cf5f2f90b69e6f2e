use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// One import declaration required by generated blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Named imports; empty means a side-effect import
    #[serde(default)]
    pub names: Vec<String>,
    pub module: String,
}

impl ImportSpec {
    pub fn new(names: &[&str], module: &str) -> Self {
        ImportSpec {
            names: names.iter().map(|n| n.to_string()).collect(),
            module: module.to_string(),
        }
    }

    /// Render as a single import line, e.g. `import { test } from '@playwright/test';`
    pub fn render(&self) -> String {
        if self.names.is_empty() {
            format!("import '{}';", self.module)
        } else {
            format!(
                "import {{ {} }} from '{}';",
                self.names.join(", "),
                self.module
            )
        }
    }
}

/// Which lifecycle hook a template belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

impl HookKind {
    /// Playwright method name for the hook
    pub fn method(self) -> &'static str {
        match self {
            HookKind::BeforeAll => "beforeAll",
            HookKind::BeforeEach => "beforeEach",
            HookKind::AfterEach => "afterEach",
            HookKind::AfterAll => "afterAll",
        }
    }
}

/// Body of a lifecycle hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookTemplate {
    /// Fixture destructuring passed to the callback, e.g. `{ page }`
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub body: Vec<String>,
}

impl HookTemplate {
    pub fn new(args: &str, body: &[&str]) -> Self {
        HookTemplate {
            args: args.to_string(),
            body: body.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleHooks {
    #[serde(default)]
    pub before_all: Option<HookTemplate>,
    #[serde(default)]
    pub before_each: Option<HookTemplate>,
    #[serde(default)]
    pub after_each: Option<HookTemplate>,
    #[serde(default)]
    pub after_all: Option<HookTemplate>,
}

impl LifecycleHooks {
    /// Defined hooks in render order: beforeAll, beforeEach, afterEach, afterAll.
    pub fn in_order(&self) -> Vec<(HookKind, &HookTemplate)> {
        [
            (HookKind::BeforeAll, &self.before_all),
            (HookKind::BeforeEach, &self.before_each),
            (HookKind::AfterEach, &self.after_each),
            (HookKind::AfterAll, &self.after_all),
        ]
        .into_iter()
        .filter_map(|(kind, hook)| hook.as_ref().map(|h| (kind, h)))
        .collect()
    }
}

/// Rendering rules and policy values for one target application.
///
/// Templates use `{name}` placeholders: `describe` takes `{title}` and
/// `{key}`, `test` takes `{name}`, `step` takes `{n}` and `{text}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub imports: Vec<ImportSpec>,
    #[serde(default = "default_describe")]
    pub describe: String,
    #[serde(default)]
    pub hooks: LifecycleHooks,
    #[serde(default = "default_test")]
    pub test: String,
    #[serde(default = "default_step")]
    pub step: String,
    /// Per-test timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_describe() -> String {
    "test.describe('{title} @{key}', () => {".to_string()
}

fn default_test() -> String {
    "test('{name}', async ({ page }) => {".to_string()
}

fn default_step() -> String {
    "await test.step('Step {n}: {text}', async () => {});".to_string()
}

fn default_timeout() -> u64 {
    20_000
}

fn default_retries() -> u32 {
    2
}

impl Profile {
    /// A profile with default templates, no imports and no hooks.
    pub fn new(name: &str) -> Self {
        Profile {
            name: name.to_string(),
            imports: Vec::new(),
            describe: default_describe(),
            hooks: LifecycleHooks::default(),
            test: default_test(),
            step: default_step(),
            timeout: default_timeout(),
            retries: default_retries(),
        }
    }

    /// The Playwright demo setup shared by the built-in profiles; only the
    /// setup fixture differs between applications.
    fn playwright_demo(name: &str, setup_fn: &str, setup_module: &str) -> Self {
        let setup_call = format!("await {}(page);", setup_fn);
        Profile {
            imports: vec![
                ImportSpec::new(&["test", "expect"], "@playwright/test"),
                ImportSpec::new(&[setup_fn], setup_module),
            ],
            hooks: LifecycleHooks {
                before_all: Some(HookTemplate::new(
                    "{ browser }",
                    &["console.log('Initializing test suite...');"],
                )),
                before_each: Some(HookTemplate::new("{ page }", &[setup_call.as_str()])),
                after_each: Some(HookTemplate::new(
                    "{ page }",
                    &["console.log('Resetting test state...');"],
                )),
                after_all: Some(HookTemplate::new(
                    "",
                    &["console.log('Cleaning up test suite...');"],
                )),
            },
            ..Profile::new(name)
        }
    }

    /// Profiles shipped with the binary.
    pub fn builtin() -> Vec<Profile> {
        vec![
            Profile::playwright_demo("CRM", "setupDemo", "../utils/DemoSetup"),
            Profile::playwright_demo("IMS", "setupDemoIMS", "../utils/DemoSetupIMS"),
            Profile::playwright_demo("CLIQ", "setupDemoCLIQ", "../utils/DemoSetupCLIQ"),
            Profile::playwright_demo("PW", "setupDemoPW", "../utils/DemoSetupPW"),
        ]
    }

    /// Rendered import lines in profile order.
    pub fn import_lines(&self) -> Vec<String> {
        self.imports.iter().map(ImportSpec::render).collect()
    }

    pub fn describe_header(&self, title: &str, key: &str) -> String {
        fill(&self.describe, &[("title", title), ("key", key)])
    }

    pub fn test_header(&self, name: &str) -> String {
        fill(&self.test, &[("name", name)])
    }

    pub fn step_line(&self, n: usize, text: &str) -> String {
        fill(&self.step, &[("n", &n.to_string()), ("text", text)])
    }
}

/// Substitute `{name}` placeholders in one pass. Unknown placeholders and
/// other braces are left as-is, and substituted values are never rescanned.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_render() {
        let named = ImportSpec::new(&["test", "expect"], "@playwright/test");
        assert_eq!(
            named.render(),
            "import { test, expect } from '@playwright/test';"
        );
        let side_effect = ImportSpec::new(&[], "./polyfill");
        assert_eq!(side_effect.render(), "import './polyfill';");
    }

    #[test]
    fn test_fill_does_not_rescan_values() {
        let profile = Profile::new("X");
        assert_eq!(
            profile.describe_header("uses {key} literally", "X-1"),
            "test.describe('uses {key} literally @X-1', () => {"
        );
    }

    #[test]
    fn test_fill_leaves_code_braces() {
        let profile = Profile::new("X");
        assert_eq!(
            profile.test_header("Login"),
            "test('Login', async ({ page }) => {"
        );
        assert_eq!(
            profile.step_line(3, "Click save"),
            "await test.step('Step 3: Click save', async () => {});"
        );
    }

    #[test]
    fn test_hooks_render_order() {
        let crm = Profile::builtin().remove(0);
        let kinds: Vec<HookKind> = crm.hooks.in_order().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                HookKind::BeforeAll,
                HookKind::BeforeEach,
                HookKind::AfterEach,
                HookKind::AfterAll
            ]
        );
    }

    #[test]
    fn test_hook_subset() {
        let mut profile = Profile::new("X");
        profile.hooks.after_all = Some(HookTemplate::new("", &["done();"]));
        profile.hooks.before_each = Some(HookTemplate::new("{ page }", &[]));
        let kinds: Vec<HookKind> = profile.hooks.in_order().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![HookKind::BeforeEach, HookKind::AfterAll]);
    }

    #[test]
    fn test_builtin_names() {
        let names: Vec<String> = Profile::builtin().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["CRM", "IMS", "CLIQ", "PW"]);
    }
}
