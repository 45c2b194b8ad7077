//! Command line front end for laying out address maps and computing address decoder masks.

use anyhow::Result;

use crate::{
    action::{layout::layout, masks::masks, segments::segments},
    cli::Action,
};

pub mod action;
pub mod cli;
pub mod common;

fn main() -> Result<()> {
    let invocation = cli::get_invocation();

    env_logger::Builder::new()
        .filter_level(invocation.log_level.as_filter())
        .format_timestamp(None)
        .init();
    log::debug!("running {:?}", invocation.action);

    let output = match invocation.action {
        Action::Masks(config) => masks(&config)?,
        Action::Segments(config) => segments(&config)?,
        Action::Layout(config) => layout(&config)?,
    };
    println!("{output}");

    Ok(())
}
