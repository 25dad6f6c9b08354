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

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn language() -> String {
        "en-US".into()
    }

    pub fn meta_title_template() -> String {
        "%title".into()
    }

    pub fn theme_color() -> String {
        "#000000".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn output() -> PathBuf {
        "build".into()
    }

    pub fn pages() -> PathBuf {
        "src/pages".into()
    }

    pub fn assets() -> PathBuf {
        "src/assets".into()
    }
}

// ============================================================================
// [bundle] Section Defaults
// ============================================================================

pub mod bundle {
    use crate::config::BundlerCommand;

    /// Disabled lightningcss invocation; a reasonable command is pre-filled
    /// so enabling the bundler only needs `enable = true`.
    pub fn css() -> BundlerCommand {
        BundlerCommand {
            enable: false,
            command: css_command(),
        }
    }

    /// Disabled esbuild invocation.
    pub fn js() -> BundlerCommand {
        BundlerCommand {
            enable: false,
            command: js_command(),
        }
    }

    pub fn css_command() -> Vec<String> {
        ["lightningcss", "--minify", "{input}", "--output-file", "{output}"]
            .map(String::from)
            .to_vec()
    }

    pub fn js_command() -> Vec<String> {
        ["esbuild", "--bundle", "--minify", "{input}", "--outfile={output}"]
            .map(String::from)
            .to_vec()
    }
}

// ============================================================================
// [pwa] Section Defaults
// ============================================================================

pub mod pwa {
    pub fn start_url() -> String {
        "/".into()
    }

    pub fn display() -> String {
        "standalone".into()
    }

    pub fn orientation() -> String {
        "any".into()
    }

    pub fn background_color() -> String {
        "#ffffff".into()
    }

    pub fn theme_color() -> String {
        "#000000".into()
    }
}
