//! Start-at-login registration.
//!
//! Registration is a file the session manager reads at login: a launchd
//! agent plist on macOS, an XDG autostart desktop entry elsewhere. All
//! operations are idempotent and report success as a plain `bool`.

use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const AGENT_LABEL: &str = "com.datadogalerttracker.agent";

/// Login-item manager contract.
pub trait AutoStart {
    fn enable_auto_start(&self) -> bool;
    fn disable_auto_start(&self) -> bool;
    fn is_auto_start_enabled(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFormat {
    LaunchAgentPlist,
    XdgDesktop,
}

impl EntryFormat {
    pub fn native() -> Self {
        if cfg!(target_os = "macos") {
            EntryFormat::LaunchAgentPlist
        } else {
            EntryFormat::XdgDesktop
        }
    }
}

/// A login entry launching `executable` with the `watch` command.
#[derive(Debug, Clone)]
pub struct AutoStartEntry {
    path: PathBuf,
    executable: PathBuf,
    format: EntryFormat,
}

impl AutoStartEntry {
    pub fn new(path: impl Into<PathBuf>, executable: impl Into<PathBuf>, format: EntryFormat) -> Self {
        Self {
            path: path.into(),
            executable: executable.into(),
            format,
        }
    }

    /// Entry in the current user's login directory for the running binary.
    pub fn for_current_user() -> Result<Self, AppError> {
        let executable = std::env::current_exe()?;
        let format = EntryFormat::native();

        let path = match format {
            EntryFormat::LaunchAgentPlist => dirs::home_dir()
                .ok_or_else(|| AppError::Config("Could not find home directory".into()))?
                .join("Library")
                .join("LaunchAgents")
                .join(format!("{}.plist", AGENT_LABEL)),
            EntryFormat::XdgDesktop => dirs::config_dir()
                .ok_or_else(|| AppError::Config("Could not find config directory".into()))?
                .join("autostart")
                .join("datadog-alert-tracker.desktop"),
        };

        Ok(Self::new(path, executable, format))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self) -> String {
        let exe = self.executable.display();
        match self.format {
            EntryFormat::LaunchAgentPlist => format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{exe}</string>
        <string>watch</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>StandardOutPath</key>
    <string>/dev/null</string>
    <key>StandardErrorPath</key>
    <string>/dev/null</string>
</dict>
</plist>
"#,
                label = AGENT_LABEL,
                exe = exe
            ),
            EntryFormat::XdgDesktop => format!(
                "[Desktop Entry]\n\
                 Type=Application\n\
                 Name=Datadog Alert Tracker\n\
                 Exec=\"{exe}\" watch\n\
                 X-GNOME-Autostart-enabled=true\n\
                 NoDisplay=true\n",
                exe = exe
            ),
        }
    }

    fn write(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, self.render())?;
        Ok(())
    }
}

impl AutoStart for AutoStartEntry {
    fn enable_auto_start(&self) -> bool {
        match self.write() {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Auto-start enabled");
                true
            }
            Err(err) => {
                tracing::error!("Failed to write login entry {}: {}", self.path.display(), err);
                false
            }
        }
    }

    fn disable_auto_start(&self) -> bool {
        if !self.path.exists() {
            return true;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Auto-start disabled");
                true
            }
            Err(err) => {
                tracing::error!("Failed to remove login entry {}: {}", self.path.display(), err);
                false
            }
        }
    }

    fn is_auto_start_enabled(&self) -> bool {
        self.path.exists()
    }
}
