use std::fmt::Write;

use memory_stats::memory_stats;
use tokio::runtime::Handle;

use crate::plugin::prelude::*;

pub struct Health {
    command: Trigger,
}

#[async_trait]
impl Plugin for Health {
    fn name() -> Name {
        Name::from("health")
    }

    fn author() -> Author {
        Author::from("Mikkel Kroman <mk@maero.dk>")
    }

    fn version() -> Version {
        Version::from("0.2")
    }

    fn new(_ctx: &Context) -> Self {
        Health {
            command: Trigger::new(".health"),
        }
    }

    async fn handle_message(
        &self,
        _ctx: &Context,
        client: &Client,
        message: &Message,
    ) -> Result<(), IotaError> {
        if let Command::PRIVMSG(ref channel, ref text) = message.command
            && self.command.parse(text).is_some()
        {
            client.send_privmsg(channel, report())?;
        }

        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn report() -> String {
    let mut line = String::from("\x0310>\x0f\x02 Health:\x02\x0310 ");

    if let Some(usage) = memory_stats() {
        let physical_mib = usage.physical_mem as f64 / 1024. / 1024.;
        let virtual_mib = usage.virtual_mem as f64 / 1024. / 1024.;

        write!(
            line,
            "Memory:\x0f {physical_mib:.2} MiB\x0310 (virtual:\x0f {virtual_mib:.2} MiB\x0310) "
        )
        .unwrap();
    }

    let metrics = Handle::current().metrics();

    write!(
        line,
        "Workers:\x0f {}\x0310 Tasks:\x0f {}\x0310",
        metrics.num_workers(),
        metrics.num_alive_tasks()
    )
    .unwrap();

    line
}
