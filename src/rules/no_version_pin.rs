//! no-version-pin
//!
//! Images should be pinned to an explicit tag or digest so builds are
//! reproducible.

use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "no-version-pin";
const DESCRIPTION: &str = "Images must be pinned to an explicit tag or digest.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Warning, RuleCategory::BestPractice, DESCRIPTION, check)
}

/// Tag portion of an image reference, if any.
///
/// A colon before the last `/` belongs to a registry port, not a tag.
fn image_tag(image: &str) -> Option<&str> {
    let name = image.rsplit('/').next().unwrap_or(image);
    name.split_once(':').map(|(_, tag)| tag)
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();
    let disallow_latest = ctx.config.get_bool_option("disallowLatest", false);

    for service in &ctx.compose.services {
        let Some(image) = &service.image else {
            continue;
        };
        let reference = image.value.trim();

        // Interpolated references are resolved at deploy time.
        if reference.contains('$') || reference.contains('@') {
            continue;
        }

        let message = match image_tag(reference) {
            None | Some("") => format!(
                "Service \"{}\" uses image \"{}\" without an explicit tag or digest.",
                service.name, reference
            ),
            Some("latest") if disallow_latest => format!(
                "Service \"{}\" uses the floating \"latest\" tag for image \"{}\".",
                service.name, reference
            ),
            Some(_) => continue,
        };

        findings.push(
            make_finding(
                ctx,
                ID,
                Severity::Warning,
                RuleCategory::BestPractice,
                message,
                &image.location,
            )
            .with_suggestion(format!(
                "Pin the image to a version, e.g. \"{}:<version>\", or a digest.",
                reference.trim_end_matches(":latest")
            ))
            .with_data("serviceName", service.name.clone())
            .with_data("image", reference),
        );
    }

    findings
}
