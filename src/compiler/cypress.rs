use super::selector::Locator;
use super::{ScriptOptions, ScriptWriter, escape_string};
use crate::recorder::RecordedStep;

#[derive(Debug, Clone, Copy)]
pub(super) enum Style {
    Function,
    Arrow,
}

impl Style {
    fn callback(self) -> &'static str {
        match self {
            Style::Function => "function() {",
            Style::Arrow => "() => {",
        }
    }
}

pub(super) fn render(
    steps: &[RecordedStep],
    target_url: &str,
    options: &ScriptOptions,
    style: Style,
) -> String {
    let mut out = ScriptWriter::with_capacity(steps.len() + 5);

    out.open(format!(
        "describe('{}', {}",
        escape_string(&options.suite_name),
        style.callback()
    ));
    out.open(format!(
        "it('{}', {}",
        escape_string(&options.test_name),
        style.callback()
    ));
    out.add(format!("cy.visit('{}')", escape_string(target_url)));

    for step in steps {
        let locator = Locator::resolve(step);
        out.add(format!("{}.click()", locator.to_cypress(&step.action)));
    }

    out.close("})");
    out.close("})");
    out.finish()
}
