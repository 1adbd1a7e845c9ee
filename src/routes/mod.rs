mod confirm;
mod health_check;
mod pages;
mod subscribe;
pub use confirm::*;
pub use health_check::*;
pub use pages::*;
pub use subscribe::*;

/// Print an error along with every error in its `source` chain. Used to
/// implement `Debug` for the route errors, whose `Debug` is what ends up in
/// the logs.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
