//! Interactive yes/no questions.

use dialoguer::{Confirm, theme::ColorfulTheme};
use std::io::IsTerminal;
use tracing::warn;

/// Asks `prompt` on the terminal. Declines when stdin is not a terminal or
/// the prompt cannot be shown.
///
/// 在终端上询问 `prompt`。stdin 不是终端或无法显示提示时视为拒绝。
pub fn confirm(prompt: &str, default: bool) -> bool {
    if !std::io::stdin().is_terminal() {
        return false;
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .unwrap_or_else(|e| {
            warn!(error = %e, "confirmation prompt failed");
            false
        })
}
