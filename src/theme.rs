use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Mirrored OS display theme. Anything the OS reports outside
/// light/dark (including "system") collapses to dark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

fn normalize_theme(value: &str) -> Theme {
    if value == "light" {
        Theme::Light
    } else {
        Theme::Dark
    }
}

/// The OS-owned side of theme detection. Implemented by the windowing shell;
/// out of scope here beyond its signatures.
pub trait ThemeSource {
    fn current(&self) -> Result<String, String>;
    fn subscribe(&self, callback: Box<dyn Fn(String) + Send + Sync>) -> Result<(), String>;
}

/// Locally readable mirror of the OS display theme.
///
/// Best-effort cosmetic state: if the initial read or the change
/// subscription fails, the mirror stays at its default (dark) and the
/// failure is only logged.
pub struct ThemeMirror {
    theme: Mutex<Theme>,
    listeners: Mutex<Vec<Box<dyn Fn(Theme) + Send + Sync>>>,
}

impl ThemeMirror {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            theme: Mutex::new(Theme::default()),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn theme(&self) -> Theme {
        *self.theme.lock().unwrap()
    }

    pub fn subscribe(&self, listener: Box<dyn Fn(Theme) + Send + Sync>) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Reads the current theme once, then follows change notifications for
    /// the rest of the process lifetime.
    pub fn init_theme(self: &Arc<Self>, source: &dyn ThemeSource) {
        match source.current() {
            Ok(value) => self.apply(normalize_theme(&value)),
            Err(e) => warn!("Theme detection failed, staying on dark: {}", e),
        }

        let mirror = Arc::clone(self);
        let result = source.subscribe(Box::new(move |value| {
            mirror.apply(normalize_theme(&value));
        }));
        if let Err(e) = result {
            warn!("Theme change subscription failed: {}", e);
        }
    }

    fn apply(&self, theme: Theme) {
        {
            let mut current = self.theme.lock().unwrap();
            if *current == theme {
                return;
            }
            *current = theme;
        }
        for listener in self.listeners.lock().unwrap().iter() {
            listener(theme);
        }
    }
}
