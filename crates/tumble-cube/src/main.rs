use anyhow::Result;
use tumble_cube::{CubeApp, CubeConfig};
use tumble_engine::device::GpuInit;
use tumble_engine::logging::{LoggingConfig, init_logging};
use tumble_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = CubeConfig::from_env();
    let (width, height) = config.window_size;
    let runtime = RuntimeConfig::new(config.title.clone(), width, height);

    Runtime::run(runtime, GpuInit::default(), CubeApp::new(config))
}
