//! Property tests over generated compose documents.

use dclint::{LintConfig, lint_str};
use proptest::prelude::*;

fn service_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}"
}

fn image_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("nginx".to_string()),
        Just("redis".to_string()),
        Just("library/postgres".to_string()),
        Just("registry.local:5000/team/app".to_string()),
    ]
}

fn tag() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,2}\\.[0-9]{1,2}(\\.[0-9]{1,2})?",
        "(alpine|slim|bookworm)",
        Just("latest".to_string()),
    ]
}

fn render(services: &[(String, String, Option<u16>)]) -> String {
    let mut yaml = String::from("services:\n");
    for (idx, (name, image, port)) in services.iter().enumerate() {
        yaml.push_str(&format!("  {}{}:\n    image: \"{}\"\n", name, idx, image));
        if let Some(port) = port {
            yaml.push_str(&format!("    ports:\n      - \"{}:80\"\n", port));
        }
    }
    yaml
}

proptest! {
    #[test]
    fn pinned_images_yield_no_version_findings(
        services in prop::collection::vec((service_name(), image_name(), tag()), 1..6)
    ) {
        let services: Vec<_> = services
            .into_iter()
            .map(|(name, image, tag)| (name, format!("{image}:{tag}"), None))
            .collect();
        let yaml = render(&services);

        let findings = lint_str(&yaml, "compose.yml", &LintConfig::default()).unwrap();
        prop_assert!(
            findings.iter().all(|f| f.rule_id.as_str() != "no-version-pin"),
            "{yaml}\n{findings:?}"
        );
    }

    #[test]
    fn linting_is_deterministic(
        services in prop::collection::vec(
            (service_name(), image_name(), prop::option::of(8000u16..8004)),
            1..8,
        )
    ) {
        let yaml = render(&services);
        let config = LintConfig::default();

        let first = lint_str(&yaml, "compose.yml", &config).unwrap();
        let second = lint_str(&yaml, "compose.yml", &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn arbitrary_text_never_panics(text in "[ -~\n]{0,200}") {
        let _ = lint_str(&text, "compose.yml", &LintConfig::default());
    }
}
