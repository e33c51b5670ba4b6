//! Anti-detection configuration: the init script injected into every new
//! document and the spoofed user-agent string.

/// Script evaluated before any page script on every new document in the
/// session. Alters the properties that anti-automation checks read.
pub const STEALTH_SCRIPT: &str = r#"
(() => {
    // Report no automation
    Object.defineProperty(navigator, 'webdriver', {
        get: () => false,
        configurable: true,
    });

    // A benign chrome object where extensions would normally put one
    if (window.chrome === undefined) {
        window.chrome = {};
        window.chrome.runtime = {};
    }

    // Notification permission queries resolve from the real permission state
    const originalQuery = window.navigator.permissions.query;
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );

    // Prototype-level webdriver flag
    delete navigator.__proto__.webdriver;

    // A plausible plugin list
    Object.defineProperty(navigator, 'plugins', {
        get: () => [
            {
                0: { type: 'application/pdf', description: 'Portable Document Format' },
                description: 'Portable Document Format',
                filename: 'internal-pdf-viewer',
                length: 1,
                name: 'Chrome PDF Plugin'
            },
            {
                0: { type: 'application/pdf', description: 'Portable Document Format' },
                description: 'Portable Document Format',
                filename: 'internal-pdf-viewer',
                length: 1,
                name: 'Chrome PDF Viewer'
            }
        ],
    });

    // Fixed language list
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
    });
})();
"#;

/// Chrome version token used when the config does not pin one.
pub const DEFAULT_CHROME_VERSION: &str = "135.0.7049.52";

/// Compose a realistic user-agent string for the host OS family so outbound
/// requests do not trivially reveal automation.
pub fn user_agent(chrome_version: Option<&str>) -> String {
    let os_token = if cfg!(target_os = "windows") {
        "Windows NT 10.0; Win64; x64"
    } else if cfg!(target_os = "macos") {
        "Macintosh; Intel Mac OS X 10_15_7"
    } else {
        "X11; Linux x86_64"
    };

    let version = chrome_version.unwrap_or(DEFAULT_CHROME_VERSION);

    format!(
        "Mozilla/5.0 ({os_token}) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/{version} Safari/537.36"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_embeds_os_and_version() {
        let ua = user_agent(None);
        assert!(ua.starts_with("Mozilla/5.0 ("));
        assert!(ua.contains(&format!("Chrome/{}", DEFAULT_CHROME_VERSION)));
        assert!(ua.contains("AppleWebKit/537.36"));
        assert!(ua.ends_with("Safari/537.36"));

        let pinned = user_agent(Some("120.0.0.0"));
        assert!(pinned.contains("Chrome/120.0.0.0"));
        assert!(!pinned.contains(DEFAULT_CHROME_VERSION));
    }

    #[test]
    fn stealth_script_covers_known_automation_tells() {
        assert!(STEALTH_SCRIPT.contains("'webdriver'"));
        assert!(STEALTH_SCRIPT.contains("delete navigator.__proto__.webdriver"));
        assert!(STEALTH_SCRIPT.contains("window.chrome"));
        assert!(STEALTH_SCRIPT.contains("Notification.permission"));
        assert!(STEALTH_SCRIPT.contains("Chrome PDF Viewer"));
        assert!(STEALTH_SCRIPT.contains("['en-US', 'en']"));
    }
}
