use crate::output::is_quiet;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().muted.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

/// A record was added
pub fn created(what: &str) {
    println!("{} {}", Icons::NEW.style(theme().success.clone()), what);
}

pub fn modified(what: &str) {
    println!("{} {}", Icons::MOD.style(theme().warn.clone()), what);
}

pub fn deleted(what: &str) {
    println!("{} {}", Icons::DEL.style(theme().error.clone()), what);
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().muted.clone()), value);
}
