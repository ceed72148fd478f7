mod battery;
mod catalog;
mod dispatch;

use clap::{Parser, Subcommand};

pub use self::{catalog::catalog, dispatch::dispatch};
use crate::cli::{catalog::CatalogArgs, dispatch::DispatchArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: dispatch a battery over a day and estimate its payback.
    #[clap(name = "dispatch")]
    Dispatch(Box<DispatchArgs>),

    /// List the reference battery models.
    #[clap(name = "catalog")]
    Catalog(CatalogArgs),
}
