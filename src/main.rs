use anyhow::Context;
use stagekit::console::{Console, Options};
use stagekit::{init_logging, list_ports, StageConfig, StageController, TagCatalog};
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let options = Options::parse(std::env::args().skip(1))?;
    info!(version = stagekit::VERSION, built = stagekit::BUILD_DATE, "StageKit starting");

    if options.list_ports {
        for port in list_ports()? {
            println!("{}  {}", port.port_name, port.description);
        }
        return Ok(());
    }

    let config = match &options.config {
        Some(path) => StageConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let path = StageConfig::resolve_path()?;
            StageConfig::load_or_default(&path)
                .with_context(|| format!("loading {}", path.display()))?
        }
    };

    let catalog = match &options.catalog {
        Some(path) => TagCatalog::load(path)
            .with_context(|| format!("loading tag catalog {}", path.display()))?,
        None => TagCatalog::default(),
    };
    info!(tags = catalog.len(), "Tag catalog ready");

    let controller = Arc::new(StageController::with_serial(config.to_controller_config()));
    controller.connect().context("connecting to the stage")?;
    if let Some(port) = controller.port_name() {
        println!("connected on {port}");
    }

    let mut console = Console::new(controller, catalog, config.motion.jog_step_mm);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    console.run(stdin.lock(), &mut stdout)
}
