//! Terminal styles, chosen once per process

use crate::record::{ImportanceTier, LastLogin};
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub muted: Style,
    /// Premium features that are switched on
    pub premium: Style,
    /// Accounts nobody has logged into for a year or more
    pub stale: Style,
    important: Style,
    plain: Style,
}

impl Theme {
    /// Colour only on a terminal, and never when `NO_COLOR` is set
    pub fn detect() -> Self {
        let colored = std::env::var_os("NO_COLOR").is_none() && console::Term::stdout().is_term();
        Self::new(colored)
    }

    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: pick(Style::new().cyan().bold()),
            success: pick(Style::new().green().bold()),
            error: pick(Style::new().red().bold()),
            warn: pick(Style::new().yellow().bold()),
            info: pick(Style::new().magenta()),
            muted: pick(Style::new().bright_black()),
            premium: pick(Style::new().bright_yellow()),
            stale: pick(Style::new().red()),
            important: pick(Style::new().yellow().bold()),
            plain: Style::new(),
        }
    }

    /// High-importance records stand out, the rest stay plain
    pub fn importance(&self, tier: ImportanceTier) -> Style {
        match tier {
            ImportanceTier::High => self.important.clone(),
            ImportanceTier::Medium => self.plain.clone(),
            ImportanceTier::Low => self.muted.clone(),
        }
    }

    pub fn last_login(&self, login: LastLogin) -> Style {
        if login.is_stale() {
            self.stale.clone()
        } else {
            self.plain.clone()
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
