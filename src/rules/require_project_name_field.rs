//! require-project-name-field
//!
//! The top-level `name` pins the project name instead of deriving it from
//! the directory.

use crate::parser::Location;
use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "require-project-name-field";
const DESCRIPTION: &str = "The top-level `name` field should be set.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Info, RuleCategory::BestPractice, DESCRIPTION, check).disabled_by_default()
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    if ctx.compose.name.is_some() {
        return Vec::new();
    }

    let root = &ctx.document.root;
    let location = Location::new(root.file, root.pos, "");
    vec![
        make_finding(
            ctx,
            ID,
            Severity::Info,
            RuleCategory::BestPractice,
            "The top-level \"name\" field is missing.",
            &location,
        )
        .with_suggestion("Add \"name: <project>\" at the top of the file."),
    ]
}
