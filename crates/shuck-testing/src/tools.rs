//! Probes for the external tools the tests drive

/// True when the named tool is reachable through `PATH`
pub fn have(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// True when every named tool is reachable through `PATH`
pub fn have_all(tools: &[&str]) -> bool {
    tools.iter().all(|tool| have(tool))
}
