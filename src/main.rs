//! Binary entry point: load configuration, start logging, open the records
//! database behind the bridge, and drive the terminal browser until the user
//! exits.
use anyhow::Context;
use student_records::{logging, run_app, App, Bridge, Config, Database};

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    logging::init(&config.log)?;

    let database = Database::open(&config).context("failed to open records database")?;
    let bridge = Bridge::spawn(database).context("failed to start database bridge")?;
    let capabilities = bridge.expose();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    let mut app = App::new(runtime, capabilities.my_api)?;
    let result = run_app(&mut app);
    drop(app);

    bridge.close().context("failed to close records database")?;
    result
}
