//! Static registries of launchable applications and websites.
//!
//! Lookup is an intentionally fuzzy substring match of each canonical name
//! against the lowercased request text. Entries are kept longest-name-first
//! (ties alphabetical), so "calculator" wins over "calc" and the first match
//! is deterministic.

use std::cmp::Reverse;

use crate::config::Config;

/// How to start and stop an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDescriptor {
    pub name: String,
    pub launch_command: String,
    /// Process image name for termination; `None` if the app cannot be closed.
    pub termination_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteDescriptor {
    pub name: String,
    pub url: String,
}

#[cfg(target_os = "windows")]
const BUILTIN_APPS: &[(&str, &str, Option<&str>)] = &[
    ("notepad", "notepad", Some("notepad.exe")),
    ("calculator", "calc", Some("Calculator.exe")),
    ("calc", "calc", Some("Calculator.exe")),
    ("vscode", "code", Some("Code.exe")),
    ("visual studio code", "code", Some("Code.exe")),
    ("explorer", "explorer", None),
];

#[cfg(target_os = "macos")]
const BUILTIN_APPS: &[(&str, &str, Option<&str>)] = &[
    ("notepad", "open -a TextEdit", Some("TextEdit")),
    ("calculator", "open -a Calculator", Some("Calculator")),
    ("calc", "open -a Calculator", Some("Calculator")),
    ("vscode", "open -a 'Visual Studio Code'", Some("Code")),
    ("visual studio code", "open -a 'Visual Studio Code'", Some("Code")),
    ("finder", "open -a Finder", None),
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const BUILTIN_APPS: &[(&str, &str, Option<&str>)] = &[
    ("notepad", "gedit", Some("gedit")),
    ("calculator", "gnome-calculator", Some("gnome-calculator")),
    ("calc", "gnome-calculator", Some("gnome-calculator")),
    ("vscode", "code", Some("code")),
    ("visual studio code", "code", Some("code")),
    ("terminal", "x-terminal-emulator", None),
];

const BUILTIN_WEBSITES: &[(&str, &str)] = &[
    ("google", "https://www.google.com"),
    ("youtube", "https://www.youtube.com"),
    ("github", "https://github.com"),
    ("gmail", "https://mail.google.com"),
    ("wikipedia", "https://www.wikipedia.org"),
    ("stackoverflow", "https://stackoverflow.com"),
];

#[derive(Debug, Clone, Default)]
pub struct Registry {
    apps: Vec<AppDescriptor>,
    websites: Vec<WebsiteDescriptor>,
}

impl Registry {
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for &(name, launch, handle) in BUILTIN_APPS {
            registry.insert_app(AppDescriptor {
                name: name.to_string(),
                launch_command: launch.to_string(),
                termination_handle: handle.map(str::to_string),
            });
        }
        for &(name, url) in BUILTIN_WEBSITES {
            registry.insert_website(WebsiteDescriptor {
                name: name.to_string(),
                url: url.to_string(),
            });
        }
        registry
    }

    /// Built-in entries with `[apps]` and `[websites]` from the config
    /// merged over them.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::builtin();
        for (name, entry) in &config.apps {
            registry.insert_app(AppDescriptor {
                name: name.to_lowercase(),
                launch_command: entry.launch.clone(),
                termination_handle: entry.process.clone(),
            });
        }
        for (name, url) in &config.websites {
            registry.insert_website(WebsiteDescriptor {
                name: name.to_lowercase(),
                url: url.clone(),
            });
        }
        registry
    }

    /// Add or replace an application entry.
    pub fn insert_app(&mut self, app: AppDescriptor) {
        self.apps.retain(|a| a.name != app.name);
        self.apps.push(app);
        self.apps
            .sort_by(|a, b| (Reverse(a.name.len()), &a.name).cmp(&(Reverse(b.name.len()), &b.name)));
    }

    /// Add or replace a website entry.
    pub fn insert_website(&mut self, site: WebsiteDescriptor) {
        self.websites.retain(|w| w.name != site.name);
        self.websites.push(site);
        self.websites
            .sort_by(|a, b| (Reverse(a.name.len()), &a.name).cmp(&(Reverse(b.name.len()), &b.name)));
    }

    pub fn apps(&self) -> &[AppDescriptor] {
        &self.apps
    }

    pub fn websites(&self) -> &[WebsiteDescriptor] {
        &self.websites
    }

    /// First app whose name appears in `text`.
    pub fn resolve_app(&self, text: &str) -> Option<&AppDescriptor> {
        let text = text.to_lowercase();
        self.apps.iter().find(|app| text.contains(&app.name))
    }

    /// First website whose name appears in `text`.
    pub fn resolve_website(&self, text: &str) -> Option<&WebsiteDescriptor> {
        let text = text.to_lowercase();
        self.websites.iter().find(|site| text.contains(&site.name))
    }

    /// Exact lookup by canonical name.
    pub fn app(&self, name: &str) -> Option<&AppDescriptor> {
        self.apps.iter().find(|app| app.name == name)
    }

    pub fn website(&self, name: &str) -> Option<&WebsiteDescriptor> {
        self.websites.iter().find(|site| site.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppEntry;

    #[test]
    fn longest_name_wins() {
        let registry = Registry::builtin();
        assert_eq!(registry.resolve_app("open calculator").unwrap().name, "calculator");
        assert_eq!(registry.resolve_app("open calc please").unwrap().name, "calc");
        assert_eq!(
            registry.resolve_app("start Visual Studio Code").unwrap().name,
            "visual studio code"
        );
    }

    #[test]
    fn ordering_is_deterministic() {
        let registry = Registry::builtin();
        let names: Vec<&str> = registry.apps().iter().map(|a| a.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_by(|a, b| (Reverse(a.len()), *a).cmp(&(Reverse(b.len()), *b)));
        assert_eq!(names, sorted);
        assert_eq!(names.first(), Some(&"visual studio code"));
    }

    #[test]
    fn miss_returns_none() {
        let registry = Registry::builtin();
        assert!(registry.resolve_app("open photoshop").is_none());
        assert!(registry.resolve_website("go to myspace").is_none());
    }

    #[test]
    fn websites_resolve_by_substring() {
        let registry = Registry::builtin();
        let site = registry.resolve_website("please open GitHub for me").unwrap();
        assert_eq!(site.name, "github");
        assert_eq!(site.url, "https://github.com");
    }

    #[test]
    fn config_entries_override_and_extend() {
        let mut config = Config::default();
        config.apps.insert(
            "Notepad".to_string(),
            AppEntry {
                launch: "kate".to_string(),
                process: Some("kate".to_string()),
            },
        );
        config.apps.insert(
            "blender".to_string(),
            AppEntry {
                launch: "blender".to_string(),
                process: None,
            },
        );
        config
            .websites
            .insert("docs".to_string(), "https://docs.rs".to_string());

        let registry = Registry::from_config(&config);
        assert_eq!(registry.app("notepad").unwrap().launch_command, "kate");
        assert_eq!(registry.apps().iter().filter(|a| a.name == "notepad").count(), 1);
        assert!(registry.app("blender").unwrap().termination_handle.is_none());
        assert_eq!(registry.resolve_website("open docs").unwrap().url, "https://docs.rs");
    }
}
