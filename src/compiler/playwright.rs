use super::selector::Locator;
use super::{ScriptOptions, ScriptWriter, escape_string};
use crate::recorder::RecordedStep;

pub(super) fn render(steps: &[RecordedStep], target_url: &str, options: &ScriptOptions) -> String {
    let mut out = ScriptWriter::with_capacity(steps.len() + 7);

    out.add("import { test } from '@playwright/test';");
    out.add_empty();
    out.open(format!(
        "test.describe('{}', () => {{",
        escape_string(&options.suite_name)
    ));
    out.open(format!(
        "test('{}', async ({{ page }}) => {{",
        escape_string(&options.test_name)
    ));
    out.add(format!("await page.goto('{}');", escape_string(target_url)));

    for step in steps {
        out.add(format!("await {}.click();", Locator::resolve(step).to_playwright()));
    }

    out.close("});");
    out.close("});");
    out.finish()
}
