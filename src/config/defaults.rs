//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

/// Default config file name, looked up relative to the project root.
pub const CONFIG_FILE: &str = "quire.toml";

// ============================================================================
// [content] Section Defaults
// ============================================================================

pub mod content {
    use std::path::PathBuf;

    pub fn posts() -> PathBuf {
        "_posts".into()
    }

    pub fn drafts() -> PathBuf {
        "_drafts".into()
    }

    pub fn extensions() -> Vec<String> {
        vec!["md".into(), "markdown".into()]
    }

    pub fn permalink() -> String {
        "/log/:year/:month/:day/:title".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn command() -> Vec<String> {
        vec!["bundle".into(), "exec".into(), "jekyll".into(), "build".into()]
    }

    pub fn destination_flag() -> String {
        "--destination".into()
    }

    pub fn drafts_flag() -> String {
        "--drafts".into()
    }

    pub fn output() -> PathBuf {
        "_site".into()
    }

    pub fn releases() -> PathBuf {
        ".releases".into()
    }

    pub fn keep() -> usize {
        5
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        4000
    }

    pub fn workers() -> usize {
        4
    }
}

// ============================================================================
// [container] Section Defaults
// ============================================================================

pub mod container {
    use std::path::PathBuf;

    pub fn command() -> Vec<String> {
        vec!["docker".into()]
    }

    pub fn dockerfile() -> PathBuf {
        "Dockerfile".into()
    }

    pub fn context() -> PathBuf {
        ".".into()
    }

    pub fn tag() -> String {
        "quire-toolchain".into()
    }
}

// ============================================================================
// [deploy] Section Defaults
// ============================================================================

pub mod deploy {
    pub fn command() -> Vec<String> {
        vec!["rsync".into(), "-az".into(), "--delete".into()]
    }
}
