use super::escape_string;
use crate::recorder::{RecordedStep, TargetInfo};

/// Best available way to find a recorded element again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator<'a> {
    TestId(&'a str),
    Role { role: &'a str, name: &'a str },
    Text(&'a str),
    Css(&'a str),
    /// No usable hint; the action identifier doubles as a selector.
    Action(&'a str),
}

impl<'a> Locator<'a> {
    /// Picks the strongest hint: test id, then role and name, then text, then css.
    pub fn resolve(step: &'a RecordedStep) -> Self {
        step.target
            .as_ref()
            .and_then(Self::from_target)
            .unwrap_or(Locator::Action(&step.action))
    }

    fn from_target(target: &'a TargetInfo) -> Option<Self> {
        if let Some(testid) = non_empty(target.testid.as_deref()) {
            return Some(Locator::TestId(testid));
        }

        if let Some((role, name)) = target.role_and_name() {
            return Some(Locator::Role { role, name });
        }

        if let Some(text) = non_empty(target.text.as_deref()) {
            return Some(Locator::Text(text));
        }

        non_empty(target.css.as_deref()).map(Locator::Css)
    }

    pub fn to_playwright(&self) -> String {
        match self {
            Locator::TestId(testid) => format!("page.getByTestId('{}')", escape_string(testid)),
            Locator::Role { role, name } => format!(
                "page.getByRole('{}', {{ name: '{}', exact: true }})",
                escape_string(role),
                escape_string(name)
            ),
            Locator::Text(text) => format!("page.getByText('{}')", escape_string(text)),
            Locator::Css(selector) | Locator::Action(selector) => {
                format!("page.locator('{}')", escape_string(selector))
            }
        }
    }

    /// `action` scopes `cy.contains` to the element kind that was recorded.
    pub fn to_cypress(&self, action: &str) -> String {
        match self {
            Locator::TestId(testid) => format!(
                "cy.get('[data-testid=\"{}\"]')",
                escape_string(&testid.replace('"', "\\\""))
            ),
            Locator::Role { name, .. } | Locator::Text(name) => format!(
                "cy.contains('{}', '{}')",
                escape_string(action),
                escape_string(name)
            ),
            Locator::Css(selector) | Locator::Action(selector) => {
                format!("cy.get('{}')", escape_string(selector))
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::ArtifactRef;

    fn make_target(aria: &[&str], testid: Option<&str>, css: Option<&str>) -> TargetInfo {
        TargetInfo {
            aria: aria.iter().map(|s| s.to_string()).collect(),
            css: css.map(String::from),
            testid: testid.map(String::from),
            text: None,
        }
    }

    fn step_with(target: TargetInfo) -> RecordedStep {
        RecordedStep::new("button", 1, ArtifactRef::Unavailable).with_target(target)
    }

    #[test]
    fn test_locator_priority() {
        let testid = step_with(make_target(&["button", "Submit"], Some("submit"), Some("#b")));
        assert_eq!(Locator::resolve(&testid), Locator::TestId("submit"));

        let aria = step_with(make_target(&["button", "Submit"], None, Some("#btn")));
        assert_eq!(
            Locator::resolve(&aria),
            Locator::Role {
                role: "button",
                name: "Submit"
            }
        );

        let css = step_with(make_target(&[], None, Some("#submit-btn")));
        assert_eq!(Locator::resolve(&css), Locator::Css("#submit-btn"));

        let bare = RecordedStep::new("link", 1, ArtifactRef::Unavailable);
        assert_eq!(Locator::resolve(&bare), Locator::Action("link"));
    }

    #[test]
    fn test_blank_hints_fall_through() {
        let step = step_with(make_target(&[], Some("  "), Some("")));
        assert_eq!(Locator::resolve(&step), Locator::Action("button"));
    }

    #[test]
    fn test_rendering() {
        assert_eq!(
            Locator::TestId("submit").to_playwright(),
            "page.getByTestId('submit')"
        );
        assert_eq!(
            Locator::TestId("submit").to_cypress("button"),
            "cy.get('[data-testid=\"submit\"]')"
        );
        assert_eq!(
            Locator::Text("Don't").to_cypress("a"),
            "cy.contains('a', 'Don\\'t')"
        );
        assert_eq!(Locator::Action("link").to_playwright(), "page.locator('link')");
    }
}
