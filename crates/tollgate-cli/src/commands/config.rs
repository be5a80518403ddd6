//! `tollgate config` subcommands.

use std::path::Path;

use anyhow::{Context, Result};

use crate::ConfigCommands;

pub(crate) fn run(command: &ConfigCommands, explicit: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let resolved = tollgate_config::load(explicit, None)?;
            print!("{}", resolved.to_annotated_toml()?);
        },
        ConfigCommands::Validate => {
            let resolved =
                tollgate_config::load(explicit, None).context("configuration is invalid")?;
            if resolved.loaded_files.is_empty() {
                println!("OK (defaults only)");
            } else {
                println!("OK ({})", resolved.loaded_files.join(", "));
            }
        },
        ConfigCommands::Paths => {
            println!("/etc/tollgate/config.toml");
            match directories::BaseDirs::new() {
                Some(dirs) => println!("{}", dirs.home_dir().join(".tollgate/config.toml").display()),
                None => println!("~/.tollgate/config.toml (home directory unknown)"),
            }
            if let Some(path) = explicit {
                println!("{}", path.display());
            }
        },
    }
    Ok(())
}
