//! no-build-and-image
//!
//! A service cannot have both `build` and `image`, unless `pull_policy`
//! tells compose to build it (`build`) or never pull it (`never`).

use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "no-build-and-image";
const DESCRIPTION: &str = "Each service must use either `build` or `image`, not both.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Error, RuleCategory::BestPractice, DESCRIPTION, check)
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();
    let check_pull_policy = ctx.config.get_bool_option("checkPullPolicy", true);

    for service in &ctx.compose.services {
        let (Some(build), Some(_)) = (&service.build, &service.image) else {
            continue;
        };

        let local_image = matches!(service.pull_policy.as_deref(), Some("build" | "never"));
        if check_pull_policy && local_image {
            continue;
        }

        let message = format!(
            "Service \"{}\" is using both \"build\" and \"image\". Use one of them, but not both.",
            service.name
        );

        findings.push(
            make_finding(
                ctx,
                ID,
                Severity::Error,
                RuleCategory::BestPractice,
                message,
                build,
            )
            .with_data("serviceName", service.name.clone()),
        );
    }

    findings
}
