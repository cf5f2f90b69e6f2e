use crate::model::issue::Issue;
use crate::model::profile::{HookKind, HookTemplate, Profile};
use crate::model::registry::ProfileRegistry;

/// Indentation unit inside generated blocks
const INDENT: &str = "  ";

/// Error type for rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown profile '{name}' (available: {available})")]
    ProfileNotFound { name: String, available: String },
}

/// Look up a profile by application name.
pub fn resolve_profile<'a>(
    registry: &'a ProfileRegistry,
    name: &str,
) -> Result<&'a Profile, RenderError> {
    registry.get(name).ok_or_else(|| RenderError::ProfileNotFound {
        name: name.to_string(),
        available: registry.names().collect::<Vec<_>>().join(", "),
    })
}

/// Render an issue with the named profile.
pub fn format(
    issue: &Issue,
    profile_name: &str,
    registry: &ProfileRegistry,
) -> Result<String, RenderError> {
    let profile = resolve_profile(registry, profile_name)?;
    tracing::debug!(key = %issue.key, profile = profile_name, "rendering block");
    Ok(render_block(issue, profile))
}

/// Render one issue into its generated block. The result has no trailing
/// newline and is identical for identical inputs.
pub fn render_block(issue: &Issue, profile: &Profile) -> String {
    let mut lines = Vec::new();
    let title = escape_single_quoted(&issue.title);

    lines.push(profile.describe_header(&title, &issue.key));

    // Acceptance criteria as a checklist doc comment
    lines.push(format!("{INDENT}/**"));
    lines.push(format!("{INDENT} * Acceptance Criteria:"));
    for ac_line in issue.acceptance_criteria.lines() {
        let item = format!("{INDENT} * - [ ] {}", ac_line.trim().replace("*/", "*\\/"));
        lines.push(item.trim_end().to_string());
    }
    lines.push(format!("{INDENT} */"));
    lines.push(format!(
        "{INDENT}test.describe.configure({{ retries: {}, timeout: {} }});",
        profile.retries, profile.timeout
    ));

    for (kind, hook) in profile.hooks.in_order() {
        lines.push(String::new());
        render_hook(kind, hook, &mut lines);
    }

    lines.push(String::new());
    lines.push(format!("{INDENT}{}", profile.test_header(&title)));
    let steps = issue
        .acceptance_criteria
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty());
    for (i, step) in steps.enumerate() {
        lines.push(format!(
            "{INDENT}{INDENT}{}",
            profile.step_line(i + 1, &escape_single_quoted(step))
        ));
    }
    lines.push(format!("{INDENT}}});"));
    lines.push("});".to_string());

    lines.join("\n")
}

fn render_hook(kind: HookKind, hook: &HookTemplate, lines: &mut Vec<String>) {
    let params = match hook.args.trim() {
        "" => "()".to_string(),
        args => format!("({args})"),
    };
    lines.push(format!(
        "{INDENT}test.{}(async {} => {{",
        kind.method(),
        params
    ));
    for body_line in &hook.body {
        if body_line.trim().is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("{INDENT}{INDENT}{}", body_line.trim_end()));
        }
    }
    lines.push(format!("{INDENT}}});"));
}

/// Make text safe inside a single-quoted string literal.
fn escape_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::scan;
    use pretty_assertions::assert_eq;

    fn crm() -> Profile {
        ProfileRegistry::with_builtins().get("CRM").unwrap().clone()
    }

    #[test]
    fn test_render_crm_block() {
        let issue = Issue::new(
            "CRM-1",
            "Customer Interaction Tracking",
            "Log every call\n\n  Show history  ",
        );
        insta::assert_snapshot!(render_block(&issue, &crm()), @r"
        test.describe('Customer Interaction Tracking @CRM-1', () => {
          /**
           * Acceptance Criteria:
           * - [ ] Log every call
           * - [ ]
           * - [ ] Show history
           */
          test.describe.configure({ retries: 2, timeout: 20000 });

          test.beforeAll(async ({ browser }) => {
            console.log('Initializing test suite...');
          });

          test.beforeEach(async ({ page }) => {
            await setupDemo(page);
          });

          test.afterEach(async ({ page }) => {
            console.log('Resetting test state...');
          });

          test.afterAll(async () => {
            console.log('Cleaning up test suite...');
          });

          test('Customer Interaction Tracking', async ({ page }) => {
            await test.step('Step 1: Log every call', async () => {});
            await test.step('Step 2: Show history', async () => {});
          });
        });
        ");
    }

    #[test]
    fn test_render_is_deterministic() {
        let issue = Issue::new("CRM-9", "Title", "a\nb\nc");
        assert_eq!(render_block(&issue, &crm()), render_block(&issue, &crm()));
    }

    #[test]
    fn test_render_minimal_profile() {
        let issue = Issue::new("X-2", "Bare", "");
        let rendered = render_block(&issue, &Profile::new("X"));
        assert_eq!(
            rendered,
            "\
test.describe('Bare @X-2', () => {
  /**
   * Acceptance Criteria:
   */
  test.describe.configure({ retries: 2, timeout: 20000 });

  test('Bare', async ({ page }) => {
  });
});"
        );
    }

    #[test]
    fn test_render_escapes_quotes_and_comment_end() {
        let issue = Issue::new("X-3", "Don't panic", "It's fine */ really");
        let rendered = render_block(&issue, &Profile::new("X"));
        assert!(rendered.starts_with("test.describe('Don\\'t panic @X-3', () => {"));
        assert!(rendered.contains("   * - [ ] It's fine *\\/ really"));
        assert!(rendered.contains("Step 1: It\\'s fine */ really"));
    }

    #[test]
    fn test_rendered_block_is_located() {
        let issue = Issue::new("CRM-4", "Braces { in } title", "Open {\nClose }");
        let rendered = render_block(&issue, &crm());
        let state = scan(&rendered);
        assert_eq!(state.block_text("CRM-4"), Some(rendered.as_str()));
    }

    #[test]
    fn test_format_unknown_profile() {
        let registry = ProfileRegistry::with_builtins();
        let issue = Issue::new("X-1", "t", "");
        let err = format(&issue, "NOPE", &registry).unwrap_err();
        assert!(err.to_string().contains("unknown profile 'NOPE'"));
        assert!(err.to_string().contains("CRM"));
    }

    #[test]
    fn test_format_known_profile() {
        let registry = ProfileRegistry::with_builtins();
        let issue = Issue::new("IMS-1", "Stock", "Count items");
        let rendered = format(&issue, "IMS", &registry).unwrap();
        assert!(rendered.contains("await setupDemoIMS(page);"));
    }
}
