//! Private Flatpak installation under the cache directory.

use tracing::{debug, info};
use url::Url;

use flatmeta_config::Config;
use flatmeta_utils::fs::ensure_dir_exists;

use crate::{
    cancel::CancelToken,
    command::CommandRunner,
    error::MetaError,
    flatpak::FlatpakCli,
    options::Options,
    ostree::OstreeCli,
    store::RemoteCatalog,
    Result,
};

/// The installation root and the tools driving it.
pub struct Installation {
    pub catalog: FlatpakCli,
    pub store: OstreeCli,
}

impl Installation {
    /// Creates the installation root if needed and wires up the tool backends.
    pub fn open(config: &Config) -> Result<Self> {
        let root = config.get_installation_path()?;
        ensure_dir_exists(&root)?;
        debug!("Using installation at {}", root.display());

        let runner = CommandRunner::new(config.poll_interval());
        Ok(Self {
            catalog: FlatpakCli::new(config.flatpak_bin(), &root, runner.clone()),
            store: OstreeCli::new(config.ostree_bin(), config.get_repo_path()?, runner),
        })
    }
}

/// Makes sure `options.remote_name` is known, registering it when a URL was given.
pub fn ensure_remote(
    catalog: &dyn RemoteCatalog,
    options: &Options,
    cancel: &CancelToken,
) -> Result<()> {
    let name = &options.remote_name;
    if catalog
        .remote_names(cancel)?
        .iter()
        .any(|remote| remote == name)
    {
        debug!("Remote {name} already configured");
        return Ok(());
    }

    let Some(url) = options.remote_url.as_deref() else {
        return Err(MetaError::RemoteNotFound(name.clone()));
    };
    let url = Url::parse(url).map_err(|source| {
        MetaError::InvalidUrl {
            url: url.to_string(),
            source,
        }
    })?;

    info!("Adding remote {name} with URL {url}");
    catalog.add_remote(name, &url, cancel)
}
