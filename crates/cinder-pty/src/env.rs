//! Shell selection and the per-process environment overlay.
//!
//! Nothing here mutates the host process environment. The host environment
//! is captured into a [`HostEnv`] snapshot and combined with the
//! [`TerminalConfig`] into a [`LaunchPlan`], which the spawner applies to the
//! child only.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::config::TerminalConfig;

/// Shell used on Windows unless the config overrides it.
pub const WINDOWS_SHELL: &str = r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe";

/// Shell used on Unix when `$SHELL` is unset or empty.
pub const FALLBACK_SHELL: &str = "bash";

/// Default `TERM` advertised to the shell.
pub const DEFAULT_TERM: &str = "xterm-color";

/// Toolchain directory appended to `Path` on Windows by default.
pub const WINDOWS_TOOLCHAIN_DIR: &str = r"C:\mingw64\bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Name of the search-path variable. Windows spells it `Path`.
    pub fn path_var(self) -> &'static str {
        match self {
            Platform::Windows => "Path",
            Platform::Unix => "PATH",
        }
    }

    fn path_separator(self) -> &'static str {
        match self {
            Platform::Windows => ";",
            Platform::Unix => ":",
        }
    }
}

/// The parts of the host environment a launch depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnv {
    pub shell: Option<String>,
    pub home: Option<PathBuf>,
    pub path: Option<OsString>,
}

impl HostEnv {
    /// Snapshot the current process environment.
    pub fn capture(platform: Platform) -> Self {
        Self {
            shell: std::env::var("SHELL").ok().filter(|s| !s.is_empty()),
            home: dirs::home_dir(),
            path: std::env::var_os(platform.path_var()),
        }
    }
}

/// Declarative environment changes applied on top of the inherited
/// environment of every spawned shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverlay {
    pub path_append: Vec<PathBuf>,
    pub vars: BTreeMap<String, String>,
    pub term: String,
}

impl EnvOverlay {
    pub fn from_config(config: &TerminalConfig, platform: Platform) -> Self {
        let path_append = match (&config.path_append, platform) {
            (Some(dirs), _) => dirs.clone(),
            (None, Platform::Windows) => vec![PathBuf::from(WINDOWS_TOOLCHAIN_DIR)],
            (None, Platform::Unix) => Vec::new(),
        };
        Self {
            path_append,
            vars: config.env.clone(),
            term: config
                .term
                .clone()
                .unwrap_or_else(|| DEFAULT_TERM.to_string()),
        }
    }

    /// Variables to set on the child, in application order.
    ///
    /// `PATH` is only emitted when there is something to append.
    pub fn apply(&self, host_path: Option<&OsStr>, platform: Platform) -> Vec<(String, OsString)> {
        let mut env: Vec<(String, OsString)> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), OsString::from(v)))
            .collect();

        env.push(("TERM".to_string(), OsString::from(&self.term)));

        if !self.path_append.is_empty() {
            let mut path = host_path.map(OsStr::to_os_string).unwrap_or_default();
            for dir in &self.path_append {
                if !path.is_empty() {
                    path.push(platform.path_separator());
                }
                path.push(dir.as_os_str());
            }
            env.push((platform.path_var().to_string(), path));
        }

        env
    }
}

/// Everything needed to start one shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, OsString)>,
}

impl LaunchPlan {
    pub fn build(config: &TerminalConfig, host: &HostEnv, platform: Platform) -> Self {
        let program = config
            .shell
            .clone()
            .unwrap_or_else(|| default_shell(host, platform));

        let args = match (&config.shell_args, platform) {
            (Some(args), _) => args.clone(),
            // Keep PowerShell interactive instead of running a single command.
            (None, Platform::Windows) if config.shell.is_none() => vec!["-NoExit".to_string()],
            (None, _) => Vec::new(),
        };

        let cwd = config.cwd.clone().or_else(|| host.home.clone());
        let env = EnvOverlay::from_config(config, platform).apply(host.path.as_deref(), platform);

        Self {
            program,
            args,
            cwd,
            env,
        }
    }

    pub fn env_var(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }
}

fn default_shell(host: &HostEnv, platform: Platform) -> String {
    match platform {
        Platform::Windows => WINDOWS_SHELL.to_string(),
        Platform::Unix => host
            .shell
            .clone()
            .unwrap_or_else(|| FALLBACK_SHELL.to_string()),
    }
}
