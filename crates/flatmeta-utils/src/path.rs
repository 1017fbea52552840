use std::{env, path::PathBuf};

use nix::unistd::{getuid, User};

use crate::error::{PathError, PathResult};

/// Name shared by the binary, the cache directory and the config directory.
pub const PROGRAM_NAME: &str = "flatpak-remote-metadata";

pub trait PathResolver {
    /// Resolves a user-supplied path string into an absolute path.
    ///
    /// `$VAR` and `${VAR}` are expanded from the environment, a leading `~` becomes the home
    /// directory, and relative results are joined onto the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if a referenced variable is undefined
    /// * [`PathError::UnclosedVariable`] for `${` without a closing brace
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf>;

    /// `$HOME`, falling back to the passwd entry of the current uid.
    fn home_dir(&self) -> PathBuf;

    /// `$XDG_CONFIG_HOME` or `~/.config`.
    fn xdg_config_home(&self) -> PathBuf;

    /// `$XDG_CACHE_HOME` or `~/.cache`.
    fn xdg_cache_home(&self) -> PathBuf;
}

/// [`PathResolver`] backed by the process environment.
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let path_buf = PathBuf::from(self.expand_variables(path)?);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }

    fn home_dir(&self) -> PathBuf {
        if let Some(home) = env::var_os("HOME").filter(|home| !home.is_empty()) {
            return PathBuf::from(home);
        }

        match User::from_uid(getuid()) {
            Ok(Some(user)) => user.dir,
            _ => PathBuf::from("/"),
        }
    }

    fn xdg_config_home(&self) -> PathBuf {
        env::var_os("XDG_CONFIG_HOME")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.home_dir().join(".config"))
    }

    fn xdg_cache_home(&self) -> PathBuf {
        env::var_os("XDG_CACHE_HOME")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.home_dir().join(".cache"))
    }
}

impl SystemPathResolver {
    fn expand_variables(&self, path: &str) -> PathResult<String> {
        let mut result = String::with_capacity(path.len());
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' if chars.peek() == Some(&'{') => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(PathError::UnclosedVariable {
                            input: format!("${{{name}"),
                        });
                    }
                    result.push_str(&self.lookup_var(&name, path)?);
                }
                '$' => {
                    let mut name = String::new();
                    while let Some(&c) = chars.peek() {
                        if !(c.is_ascii_alphanumeric() || c == '_') {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    if name.is_empty() {
                        result.push('$');
                    } else {
                        result.push_str(&self.lookup_var(&name, path)?);
                    }
                }
                '~' if result.is_empty() => result.push_str(&self.home_dir().to_string_lossy()),
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn lookup_var(&self, name: &str, input: &str) -> PathResult<String> {
        let value = match name {
            "HOME" => self.home_dir(),
            "XDG_CONFIG_HOME" => self.xdg_config_home(),
            "XDG_CACHE_HOME" => self.xdg_cache_home(),
            _ => {
                return env::var(name).map_err(|_| {
                    PathError::MissingEnvVar {
                        var: name.into(),
                        input: input.into(),
                    }
                })
            }
        };
        Ok(value.to_string_lossy().into_owned())
    }
}

/// See [`PathResolver::resolve_path`].
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    SystemPathResolver.resolve_path(path)
}

/// See [`PathResolver::xdg_config_home`].
pub fn xdg_config_home() -> PathBuf {
    SystemPathResolver.xdg_config_home()
}

/// See [`PathResolver::xdg_cache_home`].
pub fn xdg_cache_home() -> PathBuf {
    SystemPathResolver.xdg_cache_home()
}

/// Default cache root: `$XDG_CACHE_HOME/flatpak-remote-metadata`.
pub fn default_cache_dir() -> PathBuf {
    xdg_cache_home().join(PROGRAM_NAME)
}

/// Default config file: `$XDG_CONFIG_HOME/flatpak-remote-metadata/config.toml`.
pub fn default_config_file() -> PathBuf {
    xdg_config_home().join(PROGRAM_NAME).join("config.toml")
}
