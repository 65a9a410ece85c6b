mod main_lib;

use main_lib::{init_tracing, run, ProbeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = ProbeArgs::parse(std::env::args().skip(1))?;
    let report = run(args).await?;
    println!("{}", report);
    Ok(())
}
