mod cli;

use touchxform::logging;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
