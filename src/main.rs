use anyhow::Context;

fn main() -> anyhow::Result<()> {
    keepsake::run(std::env::args().skip(1)).context("keepsake failed")?;
    Ok(())
}
