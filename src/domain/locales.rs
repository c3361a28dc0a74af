//! Localization tables.

/// Locale used when a request names a language without a table.
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub code: &'static str,
    strings: &'static [(&'static str, &'static str)],
}

impl Locale {
    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.strings
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, value)| *value)
    }
}

pub const LOCALES: &[Locale] = &[
    Locale {
        code: "en",
        strings: &[
            ("welcome_title", "Welcome to Our App"),
            ("welcome_subtitle", "Your journey starts here"),
            ("login_button", "Log In"),
            ("signup_button", "Sign Up"),
            ("navigation_home", "Home"),
            ("navigation_about", "About"),
            ("navigation_contact", "Contact"),
            ("footer_copyright", "© 2024 Our Company. All rights reserved."),
            ("user_profile_title", "User Profile"),
            ("user_profile_edit", "Edit Profile"),
            ("settings_title", "Settings"),
            ("settings_language", "Language"),
            ("settings_theme", "Theme"),
            ("error_404", "Page not found"),
            ("error_500", "Internal server error"),
        ],
    },
    Locale {
        code: "es",
        strings: &[
            ("welcome_title", "Bienvenido a Nuestra App"),
            ("welcome_subtitle", "Tu viaje comienza aquí"),
            ("login_button", "Iniciar Sesión"),
            ("signup_button", "Registrarse"),
            ("navigation_home", "Inicio"),
            ("navigation_about", "Acerca de"),
            ("navigation_contact", "Contacto"),
            (
                "footer_copyright",
                "© 2024 Nuestra Empresa. Todos los derechos reservados.",
            ),
            ("user_profile_title", "Perfil de Usuario"),
            ("user_profile_edit", "Editar Perfil"),
            ("settings_title", "Configuración"),
            ("settings_language", "Idioma"),
            ("settings_theme", "Tema"),
            ("error_404", "Página no encontrada"),
            ("error_500", "Error interno del servidor"),
        ],
    },
    Locale {
        code: "fr",
        strings: &[
            ("welcome_title", "Bienvenue dans Notre App"),
            ("welcome_subtitle", "Votre voyage commence ici"),
            ("login_button", "Se Connecter"),
            ("signup_button", "S'inscrire"),
            ("navigation_home", "Accueil"),
            ("navigation_about", "À Propos"),
            ("navigation_contact", "Contact"),
            (
                "footer_copyright",
                "© 2024 Notre Entreprise. Tous droits réservés.",
            ),
            ("user_profile_title", "Profil Utilisateur"),
            ("user_profile_edit", "Modifier le Profil"),
            ("settings_title", "Paramètres"),
            ("settings_language", "Langue"),
            ("settings_theme", "Thème"),
            ("error_404", "Page non trouvée"),
            ("error_500", "Erreur interne du serveur"),
        ],
    },
    Locale {
        code: "de",
        strings: &[
            ("welcome_title", "Willkommen in Unserer App"),
            ("welcome_subtitle", "Ihre Reise beginnt hier"),
            ("login_button", "Anmelden"),
            ("signup_button", "Registrieren"),
            ("navigation_home", "Startseite"),
            ("navigation_about", "Über Uns"),
            ("navigation_contact", "Kontakt"),
            (
                "footer_copyright",
                "© 2024 Unser Unternehmen. Alle Rechte vorbehalten.",
            ),
            ("user_profile_title", "Benutzerprofil"),
            ("user_profile_edit", "Profil Bearbeiten"),
            ("settings_title", "Einstellungen"),
            ("settings_language", "Sprache"),
            ("settings_theme", "Design"),
            ("error_404", "Seite nicht gefunden"),
            ("error_500", "Interner Serverfehler"),
        ],
    },
];

pub fn find_locale(code: &str) -> Option<&'static Locale> {
    LOCALES.iter().find(|locale| locale.code == code)
}

/// Table for `code`, or the default locale's table.
pub fn resolve_locale(code: &str) -> &'static Locale {
    find_locale(code).unwrap_or(&LOCALES[0])
}

pub fn locale_codes() -> Vec<&'static str> {
    LOCALES.iter().map(|locale| locale.code).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locale_is_first_table() {
        assert_eq!(LOCALES[0].code, DEFAULT_LOCALE);
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        assert_eq!(resolve_locale("pt").code, "en");
        assert_eq!(resolve_locale("de").code, "de");
    }

    #[test]
    fn tables_share_the_same_keys() {
        let reference: Vec<_> = LOCALES[0].strings.iter().map(|(key, _)| *key).collect();
        for locale in LOCALES {
            for key in &reference {
                assert!(
                    locale.lookup(key).is_some(),
                    "{} is missing {key}",
                    locale.code
                );
            }
        }
    }

    #[test]
    fn lookup_returns_translation() {
        let fr = find_locale("fr").expect("fr table");
        assert_eq!(fr.lookup("navigation_about"), Some("À Propos"));
        assert_eq!(fr.lookup("unknown_key"), None);
        assert_eq!(locale_codes(), vec!["en", "es", "fr", "de"]);
    }
}
