//! Terminal detection and capability utilities

use is_terminal::IsTerminal;
use std::env;
use std::io::{stdin, stdout};

/// Check if stdout is connected to an interactive terminal
pub fn is_interactive() -> bool {
    if !stdout().is_terminal() {
        return false;
    }

    // CI runners may allocate a TTY but nobody is there to answer
    if is_ci_environment() {
        return false;
    }

    if env::var("DEBIAN_FRONTEND").unwrap_or_default() == "noninteractive" {
        return false;
    }

    true
}

/// Whether a password prompt can be answered
pub fn can_prompt() -> bool {
    is_interactive() && stdin().is_terminal()
}

/// Check if the terminal supports ANSI escape codes for colors
pub fn supports_ansi() -> bool {
    if !is_interactive() {
        return false;
    }

    if env::var_os("NO_COLOR").is_some() {
        return false;
    }

    let term = env::var("TERM").unwrap_or_default();
    #[cfg(windows)]
    {
        term != "dumb"
    }

    #[cfg(not(windows))]
    {
        !(term == "dumb" || term.is_empty())
    }
}

/// Detect if running in a CI environment
fn is_ci_environment() -> bool {
    let ci_vars = [
        "CI",
        "CONTINUOUS_INTEGRATION",
        "JENKINS_URL",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "TRAVIS",
        "CIRCLECI",
        "BUILDKITE",
        "DRONE",
        "TEAMCITY_VERSION",
        "TF_BUILD", // Azure DevOps
    ];

    ci_vars.iter().any(|var| env::var(var).is_ok())
}
