use pipelink_client::{PipeConnector, DEFAULT_ADDRESS_PREFIX, DEFAULT_DELIMITER};
use pipelink_transport::DefaultConnector;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("pipelink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: pipelink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "target: {}",
        option_env!("PIPELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "transport: {}",
        DefaultConnector::default().transport_name()
    );
    println!("address_prefix: {DEFAULT_ADDRESS_PREFIX}");
    println!("delimiter: 0x{DEFAULT_DELIMITER:02x}");

    Ok(SUCCESS)
}
