use tracing::info;

use crate::cmd::RecvArgs;
use crate::exit::{pipe_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: RecvArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.connect.connect()?;
    let address = client.address();

    for received in 0..args.count {
        let message = client
            .receive_message()
            .map_err(|err| pipe_error("receive failed", err))?;
        print_message(&message, &address, format);

        if !message.terminated {
            info!(received = received + 1, "peer closed the pipe");
            break;
        }
    }

    client.close();
    Ok(SUCCESS)
}
