use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".webscout"))
            .unwrap_or_else(|| PathBuf::from(".webscout"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    pub fn workspace(&self) -> PathBuf {
        self.base.join("workspace")
    }

    /// Per-session browser state (user data dirs).
    pub fn browser_dir(&self) -> PathBuf {
        self.workspace().join("browser")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.workspace().join("screenshots")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::create_dir_all(self.workspace())?;
        std::fs::create_dir_all(self.browser_dir())?;
        std::fs::create_dir_all(self.screenshots_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_base() {
        let paths = Paths::with_base(PathBuf::from("/tmp/ws-test"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/ws-test/config.json"));
        assert!(paths.browser_dir().starts_with(paths.workspace()));
        assert!(paths.screenshots_dir().starts_with(paths.workspace()));
    }
}
