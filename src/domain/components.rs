//! Component templates served by the localizer.

use time::{OffsetDateTime, macros::datetime};

/// Revision timestamp reported in component metadata.
pub const TEMPLATES_LAST_UPDATED: OffsetDateTime = datetime!(2024-01-15 10:30:00 UTC);

/// A React component template with `{l10n.<key>}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentTemplate {
    /// Resource type used in request paths and cache keys.
    pub resource_type: &'static str,
    pub component_name: &'static str,
    pub component_type: &'static str,
    pub template: &'static str,
    pub required_keys: &'static [&'static str],
}

pub const COMPONENTS: &[ComponentTemplate] = &[
    ComponentTemplate {
        resource_type: "welcome",
        component_name: "WelcomeComponent",
        component_type: "functional",
        template: include_str!("../../templates/components/welcome.jsx"),
        required_keys: &[
            "welcome_title",
            "welcome_subtitle",
            "login_button",
            "signup_button",
        ],
    },
    ComponentTemplate {
        resource_type: "navigation",
        component_name: "NavigationComponent",
        component_type: "functional",
        template: include_str!("../../templates/components/navigation.jsx"),
        required_keys: &["navigation_home", "navigation_about", "navigation_contact"],
    },
    ComponentTemplate {
        resource_type: "user_profile",
        component_name: "UserProfileComponent",
        component_type: "functional",
        template: include_str!("../../templates/components/user_profile.jsx"),
        required_keys: &["user_profile_title", "user_profile_edit"],
    },
    ComponentTemplate {
        resource_type: "footer",
        component_name: "FooterComponent",
        component_type: "functional",
        template: include_str!("../../templates/components/footer.jsx"),
        required_keys: &["footer_copyright"],
    },
];

pub fn find_component(resource_type: &str) -> Option<&'static ComponentTemplate> {
    COMPONENTS
        .iter()
        .find(|component| component.resource_type == resource_type)
}

/// Resource types in declaration order.
pub fn component_types() -> Vec<&'static str> {
    COMPONENTS
        .iter()
        .map(|component| component.resource_type)
        .collect()
}
