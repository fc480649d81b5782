//! Reports over a set of findings.
//!
//! [`Report`] groups findings per component, sorted so output is stable
//! between runs. It renders as text through [`fmt::Display`] and
//! serializes with serde for CI tooling.

use std::collections::BTreeMap;
use std::fmt;

use mizan_container::key::TypeKey;
use mizan_support::rendering::{render_tree, suggest_similar};
use serde::Serialize;

use crate::findings::Findings;

const MAX_SUGGESTIONS: usize = 3;

/// Findings grouped per component.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: ReportSummary,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Components with at least one unresolvable dependency.
    pub components: usize,
    pub unresolvable_dependencies: usize,
    pub passed: bool,
}

/// One component and everything it cannot resolve.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub component: String,
    pub implementation: String,
    pub lifestyle: String,
    pub dependencies: Vec<UnresolvedDependency>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedDependency {
    pub type_name: String,
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Registered types with a similar name.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Report {
    pub(crate) fn new(findings: &Findings, registered: &[TypeKey]) -> Self {
        let available: Vec<&str> = registered.iter().map(TypeKey::type_name).collect();

        let mut grouped: BTreeMap<String, ReportEntry> = BTreeMap::new();
        for finding in findings {
            let model = finding.handler().model();
            let entry = grouped.entry(model.name().to_string()).or_insert_with(|| ReportEntry {
                component: model.name().to_string(),
                implementation: model.implementation().short_name(),
                lifestyle: model.lifestyle().to_string(),
                dependencies: Vec::new(),
            });

            let target = finding.dependency().target();
            entry.dependencies.push(UnresolvedDependency {
                type_name: target.type_name().to_string(),
                short_name: target.short_name(),
                key: finding.dependency().key().map(str::to_string),
                suggestions: suggest_similar(target.type_name(), &available, MAX_SUGGESTIONS),
            });
        }

        let mut entries: Vec<ReportEntry> = grouped.into_values().collect();
        for entry in &mut entries {
            entry
                .dependencies
                .sort_by(|a, b| (&a.type_name, &a.key).cmp(&(&b.type_name, &b.key)));
        }

        Self {
            summary: ReportSummary {
                components: entries.len(),
                unresolvable_dependencies: findings.len(),
                passed: findings.is_empty(),
            },
            entries,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summary.passed {
            return writeln!(f, "All dependencies are resolvable.");
        }

        writeln!(
            f,
            "{} unresolvable dependencies in {} components:",
            self.summary.unresolvable_dependencies, self.summary.components
        )?;

        for entry in &self.entries {
            let header = if entry.component.ends_with(&entry.implementation) {
                format!("{} [{}]", entry.implementation, entry.lifestyle)
            } else {
                format!("{} ({}) [{}]", entry.component, entry.implementation, entry.lifestyle)
            };
            let items: Vec<String> = entry.dependencies.iter().map(UnresolvedDependency::describe).collect();
            write!(f, "{}", render_tree(&header, &items))?;
        }
        Ok(())
    }
}

impl UnresolvedDependency {
    fn describe(&self) -> String {
        let mut text = match &self.key {
            Some(key) => format!("{key}: {}", self.short_name),
            None => self.short_name.clone(),
        };
        if !self.suggestions.is_empty() {
            text.push_str(&format!("  (did you mean: {}?)", self.suggestions.join(", ")));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use crate::unresolvable_dependencies;
    use mizan_container::prelude::*;

    struct ServiceWithUnknownArg;
    struct ConsumingService;
    struct SmtpClient;
    struct Mailer;

    #[test]
    fn passing_report() {
        let container = Container::builder()
            .with_factory_support()
            .register(ComponentRegistration::of::<Mailer>())
            .build()
            .unwrap();
        let registry = container.snapshot();

        let report = unresolvable_dependencies(&*registry).unwrap().report(&*registry);
        assert!(report.summary.passed);
        assert!(report.entries.is_empty());
        assert_eq!(report.to_string(), "All dependencies are resolvable.\n");
    }

    #[test]
    fn groups_and_sorts_per_component() {
        let container = Container::builder()
            .with_factory_support()
            .register(
                ComponentRegistration::of::<ServiceWithUnknownArg>()
                    .depends_on::<u64>()
                    .depends_on_named::<i32>("arg"),
            )
            .register(
                ComponentRegistration::of::<ConsumingService>()
                    .depends_on_factory::<dyn Fn() -> ServiceWithUnknownArg>(),
            )
            .build()
            .unwrap();
        let registry = container.snapshot();

        let report = unresolvable_dependencies(&*registry).unwrap().report(&*registry);
        assert!(!report.summary.passed);
        assert_eq!(report.summary.components, 2);
        assert_eq!(report.summary.unresolvable_dependencies, 3);

        let implementations: Vec<_> = report.entries.iter().map(|e| e.implementation.as_str()).collect();
        assert_eq!(implementations, ["ConsumingService", "ServiceWithUnknownArg"]);

        let service = &report.entries[1];
        assert_eq!(service.lifestyle, "Singleton");
        let names: Vec<_> = service.dependencies.iter().map(|d| d.short_name.as_str()).collect();
        assert_eq!(names, ["i32", "u64"]);
        assert_eq!(service.dependencies[0].key.as_deref(), Some("arg"));

        let text = report.to_string();
        assert!(text.starts_with("3 unresolvable dependencies in 2 components:\n"));
        assert!(text.contains("ConsumingService [Singleton]\n  └─ dyn Fn() -> ServiceWithUnknownArg"));
        assert!(text.contains("  ├─ arg: i32\n  └─ u64\n"));
    }

    #[test]
    fn suggests_registered_look_alikes() {
        let container = Container::builder()
            .with_factory_support()
            .register(ComponentRegistration::of::<SmtpClient>().named("smtp"))
            .register(ComponentRegistration::of::<Mailer>().depends_on::<Box<SmtpClient>>())
            .build()
            .unwrap();
        let registry = container.snapshot();

        let report = unresolvable_dependencies(&*registry).unwrap().report(&*registry);
        let dependency = &report.entries[0].dependencies[0];
        assert_eq!(dependency.suggestions.len(), 1);
        assert!(dependency.suggestions[0].ends_with("SmtpClient"));
        assert!(report.to_string().contains("(did you mean: "));
    }

    #[test]
    fn serializes_to_json() {
        let container = Container::builder()
            .with_factory_support()
            .register(ComponentRegistration::of::<Mailer>().named("mailer").depends_on::<i32>())
            .build()
            .unwrap();
        let registry = container.snapshot();

        let report = unresolvable_dependencies(&*registry).unwrap().report(&*registry);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["summary"]["passed"], false);
        assert_eq!(json["entries"][0]["component"], "mailer");
        assert_eq!(json["entries"][0]["dependencies"][0]["type_name"], "i32");
        assert!(json["entries"][0]["dependencies"][0].get("key").is_none());
        assert!(json["entries"][0]["dependencies"][0].get("suggestions").is_none());
    }

    /// Minimal host that is not the bundled container.
    struct StaticRegistry {
        handlers: Vec<std::sync::Arc<Handler>>,
    }

    impl HandlerRegistry for StaticRegistry {
        fn all_handlers(&self) -> Vec<std::sync::Arc<Handler>> {
            self.handlers.clone()
        }

        fn handlers_for(&self, ty: &TypeKey) -> Vec<std::sync::Arc<Handler>> {
            self.handlers.iter().filter(|h| h.supports(ty)).cloned().collect()
        }

        fn synthesize(
            &self,
            _key: Option<&str>,
            _ty: &TypeKey,
        ) -> Option<std::sync::Arc<mizan_container::model::ComponentModel>> {
            None
        }

        fn supports_factories(&self) -> bool {
            true
        }
    }

    #[test]
    fn reports_against_any_handler_registry() {
        use mizan_container::handler::HandlerId;
        use mizan_container::model::{ComponentModel, Dependency};
        use std::sync::Arc;

        let mailer = ComponentModel::new("mailer", TypeKey::of::<Mailer>())
            .with_dependencies(vec![Dependency::on::<Box<SmtpClient>>()]);
        let smtp = ComponentModel::new("smtp", TypeKey::of::<SmtpClient>());
        let registry = StaticRegistry {
            handlers: vec![
                Arc::new(Handler::new(HandlerId(0), Arc::new(mailer), HandlerState::Waiting)),
                Arc::new(Handler::new(HandlerId(1), Arc::new(smtp), HandlerState::Valid)),
            ],
        };

        let report = unresolvable_dependencies(&registry).unwrap().report(&registry);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].component, "mailer");
        let suggestions = &report.entries[0].dependencies[0].suggestions;
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].ends_with("SmtpClient"));
    }
}
