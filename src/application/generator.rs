//! Origin generator for localized components.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{OriginError, OriginGenerator};
use crate::domain::{
    components::{self, ComponentTemplate, TEMPLATES_LAST_UPDATED},
    entities::{ComponentMetadata, LocalizedComponent},
    locales,
};

/// Renders component templates against the localization tables.
#[derive(Debug, Clone)]
pub struct ComponentGenerator {
    last_updated: OffsetDateTime,
}

impl Default for ComponentGenerator {
    fn default() -> Self {
        Self {
            last_updated: TEMPLATES_LAST_UPDATED,
        }
    }
}

impl ComponentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `resource_type` for `language`.
    ///
    /// Languages without a table use the default locale's strings while the
    /// artifact still reports the requested language. Keys missing from a
    /// table render as `[key]`.
    pub fn render(
        &self,
        resource_type: &str,
        language: &str,
    ) -> Result<LocalizedComponent, OriginError> {
        let template = components::find_component(resource_type)
            .ok_or_else(|| OriginError::UnknownResource(resource_type.to_string()))?;
        let locale = locales::resolve_locale(language);

        let localized_data: BTreeMap<String, String> = template
            .required_keys
            .iter()
            .map(|key| {
                let value = locale
                    .lookup(key)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("[{key}]"));
                (key.to_string(), value)
            })
            .collect();

        debug!(
            resource_type,
            language,
            locale = locale.code,
            keys = localized_data.len(),
            "rendering component"
        );

        Ok(LocalizedComponent {
            component_name: template.component_name.to_string(),
            component_type: template.component_type.to_string(),
            language: language.to_string(),
            template: interpolate(template.template, &localized_data),
            localized_data,
            metadata: ComponentMetadata {
                component_id: component_id(template, language),
                last_updated: self.last_updated,
                required_keys: template
                    .required_keys
                    .iter()
                    .map(|key| key.to_string())
                    .collect(),
            },
            cached: false,
        })
    }
}

#[async_trait]
impl OriginGenerator<LocalizedComponent> for ComponentGenerator {
    async fn generate(
        &self,
        resource_type: &str,
        variant: &str,
    ) -> Result<LocalizedComponent, OriginError> {
        self.render(resource_type, variant)
    }
}

/// Replace every `{l10n.<key>}` placeholder with the quoted value.
pub fn interpolate(template: &str, values: &BTreeMap<String, String>) -> String {
    values
        .iter()
        .fold(template.to_string(), |rendered, (key, value)| {
            rendered.replace(&format!("{{l10n.{key}}}"), &format!("\"{value}\""))
        })
}

fn component_id(template: &ComponentTemplate, language: &str) -> String {
    format!(
        "{}_{}_{}",
        template.resource_type,
        language,
        Uuid::new_v4().simple()
    )
}
