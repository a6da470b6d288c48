//! Toggle command implementation.
use crate::cli::args::SessionArgs;

pub fn run(session: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = session.load_config()?;
    let flag = session.flag(&config);
    let active = !flag.is_active();
    flag.set(active)?;
    tracing::info!(active, store = %session.store.display(), "preference saved");
    println!("{}", if active { "enabled" } else { "disabled" });
    Ok(())
}
