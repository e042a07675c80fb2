// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal logger: write lines, clear the screen, and decide fancy-vs-plain
//! rendering up front.

use std::io::{IsTerminal, Write};

use crossterm::{cursor, terminal, ExecutableCommand};

/// Whether the output stream supports fancy rendering: not disabled by
/// `NO_COLOR`, and connected to a real terminal.
pub fn is_fancy() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| !v.is_empty()) {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// Clears the screen and moves the cursor home, or does nothing plain
/// (there's no screen to clear when output is piped).
pub fn clear_screen() {
    if !is_fancy() {
        return;
    }
    let mut stdout = std::io::stdout();
    let _ = stdout.execute(terminal::Clear(terminal::ClearType::All));
    let _ = stdout.execute(cursor::MoveTo(0, 0));
}

/// Writes one line to stdout, flushing immediately — the terminal logger is
/// the one place in this crate allowed to touch stdout directly (tracing
/// output is routed to stderr).
pub fn write_line(line: &str) {
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn no_color_disables_fancy_rendering_regardless_of_terminal() {
        std::env::set_var("NO_COLOR", "1");
        assert!(!is_fancy());
        std::env::remove_var("NO_COLOR");
    }

    #[test]
    #[serial]
    fn empty_no_color_does_not_disable_fancy_rendering() {
        std::env::set_var("NO_COLOR", "");
        let fancy_allowed = is_fancy();
        assert_eq!(fancy_allowed, std::io::stdout().is_terminal());
        std::env::remove_var("NO_COLOR");
    }
}
