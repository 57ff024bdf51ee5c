//! Command line tool to query XML Catalogs, in the manner of `xmlcatalog`.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use xcatalog::{CatalogBuilder, EntityResolutionAdapter, UriResolutionAdapter};

#[derive(clap::Parser, Debug)]
#[command(
    version,
    name = "xcatalog",
    about = "Resolve identifiers and URIs through XML Catalogs.\nWithout --catalog, the catalogs of $XML_CATALOG_FILES are used."
)]
struct CmdArgs {
    /// load the catalog FILE (can be repeated, in precedence order)
    #[arg(long, value_name = "FILE")]
    catalog: Vec<String>,
    /// resolve the public identifier ID
    #[arg(long, value_name = "ID")]
    public: Option<String>,
    /// resolve the system identifier ID
    #[arg(long, value_name = "ID")]
    system: Option<String>,
    /// resolve the URI reference HREF
    #[arg(long, value_name = "HREF")]
    uri: Option<String>,
    /// base URI used to absolutize a relative --uri
    #[arg(long, value_name = "BASE", requires = "uri")]
    base: Option<String>,
    /// dump the loaded catalog entries to stdout
    #[cfg(feature = "output")]
    #[arg(long)]
    dump: bool,
    /// trace catalog loading and lookups (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load(cmd_args: &CmdArgs) -> Result<CatalogBuilder> {
    let mut builder = if cmd_args.catalog.is_empty() {
        CatalogBuilder::from_env().context("failed to load $XML_CATALOG_FILES")?
    } else {
        CatalogBuilder::new()
    };
    if cmd_args.verbose > 0 {
        builder.set_debug(i32::from(cmd_args.verbose));
    }
    for catalog in &cmd_args.catalog {
        builder
            .load_file(catalog)
            .with_context(|| format!("failed to load catalog {catalog}"))?;
    }
    Ok(builder)
}

fn run(cmd_args: &CmdArgs) -> Result<bool> {
    let store = load(cmd_args)?.build();

    #[cfg(feature = "output")]
    if cmd_args.dump {
        store.dump(std::io::stdout().lock())?;
    }

    let mut found = true;
    if cmd_args.public.is_some() || cmd_args.system.is_some() {
        let entities = EntityResolutionAdapter::new(store.clone());
        match entities.resolve_entity(cmd_args.public.as_deref(), cmd_args.system.as_deref()) {
            Some(resolved) => println!("{}", resolved.system_id),
            None => {
                let id = cmd_args
                    .public
                    .as_deref()
                    .or(cmd_args.system.as_deref())
                    .unwrap_or_default();
                println!("No entry for {id}");
                found = false;
            }
        }
    }
    if let Some(href) = cmd_args.uri.as_deref() {
        let uris = UriResolutionAdapter::new(store);
        match uris.lookup(href, cmd_args.base.as_deref())? {
            Some(uri) => println!("{uri}"),
            None => {
                println!("No entry for URI {href}");
                found = false;
            }
        }
    }
    Ok(found)
}

fn main() -> Result<ExitCode> {
    let cmd_args = CmdArgs::parse();
    #[cfg(feature = "output")]
    let has_work = cmd_args.dump;
    #[cfg(not(feature = "output"))]
    let has_work = false;
    if !has_work
        && cmd_args.public.is_none()
        && cmd_args.system.is_none()
        && cmd_args.uri.is_none()
    {
        bail!("nothing to do: give --public, --system, --uri or --dump");
    }

    if run(&cmd_args)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
