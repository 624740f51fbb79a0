use std::process;

/// Identity used when the machine name cannot be read.
pub const UNKNOWN_HOST: &str = "unknown-host";

/// Machine name of this node.
pub fn local_host_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

/// Machine name plus process id, for several nodes sharing one machine.
pub fn local_process_id() -> String {
    format!("{}:{}", local_host_id(), process::id())
}
